use reqwest::Client;

use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use crate::utils::format_phone_international;

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.account_sid.is_empty() && !self.config.auth_token.is_empty()
    }

    /// 发送密码重置验证码短信
    pub async fn send_reset_code(&self, phone: &str, code: &str) -> AppResult<()> {
        let body = format!(
            "ClubCore: Ma xac nhan dat lai mat khau cua ban la: {}. Ma nay co hieu luc trong 15 phut.",
            code
        );
        self.send_sms(phone, &body).await
    }

    pub async fn send_sms(&self, phone: &str, body: &str) -> AppResult<()> {
        if !self.is_configured() {
            return Err(AppError::DeliveryFailed(
                "Twilio credentials not configured".to_string(),
            ));
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let to = format_phone_international(phone);
        let params = [
            ("To", to.as_str()),
            ("From", self.config.from_phone.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("SMS sent successfully: {}", to);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("SMS failed to send: {}, Error: {}", to, error_text);
            Err(AppError::DeliveryFailed(format!(
                "SMS sending failed: {}",
                error_text
            )))
        }
    }
}
