use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct EmailService {
    config: SmtpConfig,
}

impl EmailService {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.username.is_empty() && !self.config.password.is_empty()
    }

    /// 发送密码重置验证码
    pub async fn send_reset_code(&self, email: &str, code: &str) -> AppResult<()> {
        let subject = "ClubCore - Mã xác nhận đặt lại mật khẩu";
        self.send(
            email,
            subject,
            render_reset_text(code),
            render_reset_html(code),
        )
        .await
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> AppResult<()> {
        if !self.is_configured() {
            return Err(AppError::DeliveryFailed(
                "SMTP credentials not configured".to_string(),
            ));
        }

        let from: Mailbox = format!("ClubCore <{}>", self.config.from)
            .parse()
            .map_err(|e| AppError::DeliveryFailed(format!("Invalid from address: {}", e)))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::DeliveryFailed(format!("Invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| AppError::DeliveryFailed(format!("Failed to build email: {}", e)))?;

        // 587 端口走 STARTTLS
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| AppError::DeliveryFailed(format!("SMTP relay setup failed: {}", e)))?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| AppError::DeliveryFailed(format!("Email sending failed: {}", e)))?;

        log::info!("Email sent successfully to {}", to);
        Ok(())
    }
}

fn render_reset_html(code: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #1976d2;">ClubCore - Mã xác nhận đặt lại mật khẩu</h2>
  <p>Mã xác nhận đặt lại mật khẩu của bạn là:</p>
  <div style="background: #f5f5f5; padding: 20px; text-align: center; font-size: 24px; font-weight: bold; letter-spacing: 5px; margin: 20px 0;">
    {code}
  </div>
  <p style="color: #666; font-size: 12px;">Mã này có hiệu lực trong 15 phút.</p>
</div>"#,
        code = code
    )
}

fn render_reset_text(code: &str) -> String {
    format!(
        "Mã xác nhận đặt lại mật khẩu của bạn là: {}\n\nMã này có hiệu lực trong 15 phút.",
        code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_reset_bodies_contain_code() {
        let html = render_reset_html("482913");
        assert!(html.contains("482913"));
        assert!(html.contains("15 phút"));

        let text = render_reset_text("482913");
        assert!(text.contains("482913"));
        assert!(text.contains("15 phút"));
    }

    #[test]
    fn test_is_configured() {
        let service = EmailService::new(SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "noreply@example.com".to_string(),
        });
        assert!(!service.is_configured());

        let service = EmailService::new(SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: "user".to_string(),
            password: "pass".to_string(),
            from: "noreply@example.com".to_string(),
        });
        assert!(service.is_configured());
    }
}
