use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::cards::CardState;
use crate::entities::users::{UserRole, UserStatus};
use crate::entities::{
    card_entity as card, forgot_card_token_entity as token, user_entity as user,
};
use crate::error::{AppError, AppResult};
use crate::models::{ForgotCardRequestResponse, GateValidationResponse, PasscodeResponse};
use crate::utils::generate_passcode;

const PASSCODE_EXPIRY_HOURS: i64 = 24;
const MAX_REQUESTS_PER_DAY: u64 = 100;

/// 挂失补办流程：签发临时通行码、核验验证码、闸机核销
#[derive(Clone)]
pub struct ForgotCardService {
    pool: Arc<DatabaseConnection>,
}

impl ForgotCardService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// 已登录会员自助申领通行码。旧通行码立即作废，
    /// 同一会员任一时刻最多一个可用通行码。
    pub async fn request_passcode(&self, user_id: i64) -> AppResult<ForgotCardRequestResponse> {
        let member = user::Entity::find_by_id(user_id)
            .filter(user::Column::DeletedAt.is_null())
            .filter(user::Column::Role.eq(UserRole::Member))
            .filter(user::Column::Status.eq(UserStatus::Active))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        let recent = token::Entity::find()
            .filter(token::Column::UserId.eq(member.user_id))
            .filter(token::Column::CreatedAt.gte(Utc::now() - Duration::days(1)))
            .count(self.pool.as_ref())
            .await?;
        if recent >= MAX_REQUESTS_PER_DAY {
            return Err(AppError::TooManyRequests(format!(
                "Maximum {} requests per day exceeded",
                MAX_REQUESTS_PER_DAY
            )));
        }

        let txn = self.pool.begin().await?;

        token::Entity::update_many()
            .col_expr(token::Column::Used, Expr::value(true))
            .filter(token::Column::UserId.eq(member.user_id))
            .filter(token::Column::Used.eq(false))
            .filter(token::Column::Verified.eq(true))
            .filter(token::Column::ExpiresAt.gt(Utc::now()))
            .exec(&txn)
            .await?;

        let passcode = generate_passcode();
        let expires_at = Utc::now() + Duration::hours(PASSCODE_EXPIRY_HOURS);

        // 自助通道身份已由登录态证明，免验证码直接签成已核验
        token::ActiveModel {
            user_id: Set(member.user_id),
            email: Set(member.email.clone()),
            phone: Set(member.phone.clone()),
            verification_code: Set(None),
            passcode: Set(passcode.clone()),
            expires_at: Set(expires_at),
            verified: Set(true),
            used: Set(false),
            used_at: Set(None),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!("Forgot-card passcode issued for user {}", member.user_id);

        Ok(ForgotCardRequestResponse {
            passcode,
            expires_at,
        })
    }

    /// 核对验证码，通过后放出通行码
    pub async fn verify_code(&self, user_id: i64, code: &str) -> AppResult<ForgotCardRequestResponse> {
        let pending = token::Entity::find()
            .filter(token::Column::UserId.eq(user_id))
            .filter(token::Column::VerificationCode.eq(code))
            .filter(token::Column::Verified.eq(false))
            .filter(token::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(token::Column::CreatedAt)
            .one(self.pool.as_ref())
            .await?
            .ok_or(AppError::InvalidOrExpiredCode)?;

        let passcode = pending.passcode.clone();
        let expires_at = pending.expires_at;

        let mut token_am = pending.into_active_model();
        token_am.verified = Set(true);
        token_am.update(self.pool.as_ref()).await?;

        Ok(ForgotCardRequestResponse {
            passcode,
            expires_at,
        })
    }

    /// 查询当前可用的通行码
    pub async fn active_passcode(&self, user_id: i64) -> AppResult<PasscodeResponse> {
        let current = token::Entity::find()
            .filter(token::Column::UserId.eq(user_id))
            .filter(token::Column::Verified.eq(true))
            .filter(token::Column::Used.eq(false))
            .filter(token::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(token::Column::CreatedAt)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No active passcode found. Please request a new one.".to_string())
            })?;

        Ok(PasscodeResponse {
            passcode: current.passcode,
            expires_at: current.expires_at,
            used: current.used,
            used_at: current.used_at,
        })
    }

    /// 闸机核销。命中即一次性作废，返回放行所需的会员身份
    pub async fn validate_at_gate(&self, passcode: &str) -> AppResult<GateValidationResponse> {
        let matched = token::Entity::find()
            .filter(token::Column::Passcode.eq(passcode))
            .filter(token::Column::Verified.eq(true))
            .filter(token::Column::Used.eq(false))
            .filter(token::Column::ExpiresAt.gt(Utc::now()))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or expired passcode".to_string()))?;

        let member = user::Entity::find_by_id(matched.user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or expired passcode".to_string()))?;

        let active_card = card::Entity::find()
            .filter(card::Column::UserId.eq(matched.user_id))
            .filter(card::Column::State.eq(CardState::Active))
            .one(self.pool.as_ref())
            .await?;

        let user_id = matched.user_id;
        let mut token_am = matched.into_active_model();
        token_am.used = Set(true);
        token_am.used_at = Set(Some(Utc::now()));
        token_am.update(self.pool.as_ref()).await?;

        log::info!("Forgot-card passcode consumed at gate for user {}", user_id);

        Ok(GateValidationResponse {
            valid: true,
            user_id,
            username: member.username,
            member_name: member.full_name,
            card_id: active_card.as_ref().map(|c| c.card_id),
            card_code: active_card.map(|c| c.card_code),
        })
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    fn test_token(passcode: &str, verified: bool, used: bool) -> token::Model {
        token::Model {
            token_id: 1,
            user_id: 5,
            email: Some("a@example.com".to_string()),
            phone: None,
            verification_code: None,
            passcode: passcode.to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            verified,
            used,
            used_at: None,
            created_at: Some(Utc::now()),
        }
    }

    fn test_member() -> user::Model {
        user::Model {
            user_id: 5,
            username: "member5".to_string(),
            full_name: "Trần Văn B".to_string(),
            email: Some("a@example.com".to_string()),
            phone: None,
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

    #[tokio::test]
    async fn test_gate_validation_rejects_unknown_passcode() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<token::Model>::new()])
            .into_connection();
        let service = ForgotCardService::new(db);

        let err = service.validate_at_gate("NOPE1234").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_gate_validation_consumes_passcode() {
        let matched = test_token("K7MPQ2XA", true, false);
        let consumed = token::Model {
            used: true,
            used_at: Some(Utc::now()),
            ..matched.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![matched]])
            .append_query_results([vec![test_member()]])
            .append_query_results([Vec::<card::Model>::new()])
            .append_query_results([vec![consumed]])
            .into_connection();
        let service = ForgotCardService::new(db);

        let result = service.validate_at_gate("K7MPQ2XA").await.unwrap();
        assert!(result.valid);
        assert_eq!(result.user_id, 5);
        assert_eq!(result.member_name, "Trần Văn B");
        assert_eq!(result.card_code, None);
    }

    #[tokio::test]
    async fn test_verify_code_rejects_stale_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<token::Model>::new()])
            .into_connection();
        let service = ForgotCardService::new(db);

        let err = service.verify_code(5, "482913").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredCode));
    }
}
