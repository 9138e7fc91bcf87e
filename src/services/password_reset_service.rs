use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::password_reset_tokens::ResetCodeType;
use crate::entities::users::UserStatus;
use crate::entities::{password_reset_token_entity as token, user_entity as user};
use crate::error::{AppError, AppResult};
use crate::external::{EmailService, TwilioService};
use crate::models::PasswordResetRequestResponse;
use crate::utils::{generate_six_digit_code, hash_password, mask_phone, validate_password};

const CODE_EXPIRY_MINUTES: i64 = 15;

/// 找回密码：验证码签发投递、核验、改密
#[derive(Clone)]
pub struct PasswordResetService {
    pool: DatabaseConnection,
    email_service: EmailService,
    twilio_service: TwilioService,
}

impl PasswordResetService {
    pub fn new(
        pool: DatabaseConnection,
        email_service: EmailService,
        twilio_service: TwilioService,
    ) -> Self {
        Self {
            pool,
            email_service,
            twilio_service,
        }
    }

    /// 按邮箱或手机号下发 6 位验证码。邮件优先，
    /// 失败转短信并同步更新记录的送达渠道。
    pub async fn request_reset(
        &self,
        email_or_phone: &str,
    ) -> AppResult<PasswordResetRequestResponse> {
        let account = user::Entity::find()
            .filter(user::Column::DeletedAt.is_null())
            .filter(user::Column::Status.eq(UserStatus::Active))
            .filter(
                Condition::any()
                    .add(user::Column::Email.eq(email_or_phone))
                    .add(user::Column::Phone.eq(email_or_phone)),
            )
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Không tìm thấy tài khoản với email hoặc số điện thoại này".to_string(),
                )
            })?;

        // 旧验证码一律作废，保证同时只有一个有效
        token::Entity::update_many()
            .col_expr(token::Column::Used, Expr::value(true))
            .filter(token::Column::UserId.eq(account.user_id))
            .filter(token::Column::Used.eq(false))
            .filter(token::Column::ExpiresAt.gt(Utc::now()))
            .exec(&self.pool)
            .await?;

        let reset_code = generate_six_digit_code();
        let expires_at = Utc::now() + Duration::minutes(CODE_EXPIRY_MINUTES);
        let code_type = if account.email.is_some() {
            ResetCodeType::Email
        } else {
            ResetCodeType::Sms
        };

        let issued = token::ActiveModel {
            user_id: Set(account.user_id),
            email: Set(account.email.clone()),
            phone: Set(account.phone.clone()),
            reset_code: Set(reset_code.clone()),
            code_type: Set(code_type),
            expires_at: Set(expires_at),
            used: Set(false),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        let contact_info = if let Some(email) = account.email.as_deref() {
            match self.email_service.send_reset_code(email, &reset_code).await {
                Ok(()) => email.to_string(),
                Err(email_err) => {
                    log::warn!("Email delivery failed, trying SMS fallback: {email_err}");
                    let Some(phone) = account.phone.as_deref() else {
                        return Err(AppError::DeliveryFailed(format!(
                            "Không thể gửi email đến {}. Vui lòng thử lại sau.",
                            email
                        )));
                    };
                    if self
                        .twilio_service
                        .send_reset_code(phone, &reset_code)
                        .await
                        .is_err()
                    {
                        return Err(AppError::DeliveryFailed(
                            "Không thể gửi mã xác nhận qua email hoặc SMS. Vui lòng thử lại sau."
                                .to_string(),
                        ));
                    }

                    let mut token_am = issued.into_active_model();
                    token_am.code_type = Set(ResetCodeType::Sms);
                    token_am.update(&self.pool).await?;

                    mask_phone(phone)
                }
            }
        } else if let Some(phone) = account.phone.as_deref() {
            match self
                .twilio_service
                .send_reset_code(phone, &reset_code)
                .await
            {
                Ok(()) => mask_phone(phone),
                Err(sms_err) => {
                    log::warn!("SMS delivery failed: {sms_err}");
                    return Err(AppError::DeliveryFailed(format!(
                        "Không thể gửi SMS đến {}. Vui lòng thử lại sau.",
                        phone
                    )));
                }
            }
        } else {
            return Err(AppError::DeliveryFailed(
                "Tài khoản không có email hoặc số điện thoại để gửi mã xác nhận".to_string(),
            ));
        };

        log::info!("Password reset code issued for user {}", account.user_id);

        Ok(PasswordResetRequestResponse {
            user_id: account.user_id,
            contact_info,
        })
    }

    /// 单独核验验证码，改密前给前端确认一步
    pub async fn verify_code(&self, user_id: i64, code: &str) -> AppResult<()> {
        self.find_valid_token(user_id, code).await?;
        Ok(())
    }

    /// 核验通过后改密并核销验证码
    pub async fn reset_password(
        &self,
        user_id: i64,
        code: &str,
        new_password: &str,
    ) -> AppResult<()> {
        validate_password(new_password)?;

        let matched = self.find_valid_token(user_id, code).await?;
        let password_hash = hash_password(new_password)?;

        let txn = self.pool.begin().await?;

        let account = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let mut account_am = account.into_active_model();
        account_am.password_hash = Set(Some(password_hash));
        account_am.updated_at = Set(Some(Utc::now()));
        account_am.update(&txn).await?;

        let mut token_am = matched.into_active_model();
        token_am.used = Set(true);
        token_am.update(&txn).await?;

        txn.commit().await?;

        log::info!("Password reset completed for user {}", user_id);
        Ok(())
    }

    async fn find_valid_token(&self, user_id: i64, code: &str) -> AppResult<token::Model> {
        token::Entity::find()
            .filter(token::Column::UserId.eq(user_id))
            .filter(token::Column::ResetCode.eq(code))
            .filter(token::Column::Used.eq(false))
            .filter(token::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(token::Column::CreatedAt)
            .one(&self.pool)
            .await?
            .ok_or(AppError::InvalidOrExpiredCode)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;
    use crate::config::{SmtpConfig, TwilioConfig};
    use crate::entities::users::UserRole;

    fn unconfigured_email() -> EmailService {
        EmailService::new(SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "noreply@example.com".to_string(),
        })
    }

    fn unconfigured_twilio() -> TwilioService {
        TwilioService::new(TwilioConfig {
            account_sid: String::new(),
            auth_token: String::new(),
            from_phone: String::new(),
        })
    }

    fn test_account(email: Option<&str>, phone: Option<&str>) -> user::Model {
        user::Model {
            user_id: 5,
            username: "member5".to_string(),
            full_name: "Trần Văn B".to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            address: None,
            role: UserRole::Member,
            status: UserStatus::Active,
            password_hash: None,
            points: 0,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    fn issued_token(code: &str) -> token::Model {
        token::Model {
            token_id: 1,
            user_id: 5,
            email: Some("a@example.com".to_string()),
            phone: None,
            reset_code: code.to_string(),
            code_type: ResetCodeType::Email,
            expires_at: Utc::now() + Duration::minutes(15),
            used: false,
            created_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_request_reset_rejects_unknown_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let service = PasswordResetService::new(db, unconfigured_email(), unconfigured_twilio());

        let err = service.request_reset("nobody@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_request_reset_reports_delivery_failure() {
        // 邮件投递失败且没有手机号可回退
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_account(Some("a@example.com"), None)]])
            .append_query_results([vec![issued_token("482913")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = PasswordResetService::new(db, unconfigured_email(), unconfigured_twilio());

        let err = service.request_reset("a@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::DeliveryFailed(_)));
    }

    #[tokio::test]
    async fn test_verify_code_rejects_stale_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<token::Model>::new()])
            .into_connection();
        let service = PasswordResetService::new(db, unconfigured_email(), unconfigured_twilio());

        let err = service.verify_code(5, "000000").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredCode));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_short_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = PasswordResetService::new(db, unconfigured_email(), unconfigured_twilio());

        let err = service.reset_password(5, "482913", "123").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
