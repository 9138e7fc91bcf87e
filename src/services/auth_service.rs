use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::cards::CardState;
use crate::entities::users::{UserRole, UserStatus};
use crate::entities::{card_entity as card, user_entity as user};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{JwtService, verify_password};

#[derive(Clone)]
pub struct AuthService {
    pool: Arc<DatabaseConnection>,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self {
            pool: Arc::new(pool),
            jwt_service,
        }
    }

    /// 刷卡或账号密码二选一登录
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        if let Some(card_code) = request.card_code.as_deref()
            && !card_code.is_empty()
        {
            return self.login_by_card(card_code).await;
        }

        if let (Some(username), Some(password)) =
            (request.username.as_deref(), request.password.as_deref())
            && !username.is_empty()
            && !password.is_empty()
        {
            return self.login_by_password(username, password).await;
        }

        Err(AppError::ValidationError(
            "Either card_code or (username and password) is required".to_string(),
        ))
    }

    async fn login_by_card(&self, card_code: &str) -> AppResult<AuthResponse> {
        let active_card = card::Entity::find()
            .filter(card::Column::CardCode.eq(card_code))
            .filter(card::Column::State.eq(CardState::Active))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::AuthError("Invalid card code or account not found".to_string())
            })?;

        // 只有会员账号可以刷卡登录
        let member = user::Entity::find_by_id(active_card.user_id)
            .filter(user::Column::DeletedAt.is_null())
            .filter(user::Column::Role.eq(UserRole::Member))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::AuthError("Invalid card code or account not found".to_string())
            })?;

        log::info!(
            "User {} logged in by card {}",
            member.user_id,
            active_card.card_code
        );
        self.issue_tokens(member, Some(active_card))
    }

    async fn login_by_password(&self, username: &str, password: &str) -> AppResult<AuthResponse> {
        let member = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::DeletedAt.is_null())
            .filter(user::Column::Role.eq(UserRole::Member))
            .filter(user::Column::Status.eq(UserStatus::Active))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

        // 纯刷卡账号没有密码，不能走这条路径
        let password_hash = member
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

        if !verify_password(password, password_hash)? {
            return Err(AppError::AuthError(
                "Invalid username or password".to_string(),
            ));
        }

        let active_card = card::Entity::find()
            .filter(card::Column::UserId.eq(member.user_id))
            .filter(card::Column::State.eq(CardState::Active))
            .one(self.pool.as_ref())
            .await?;

        log::info!("User {} logged in by password", member.user_id);
        self.issue_tokens(member, active_card)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        let member = user::Entity::find_by_id(user_id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let active_card = card::Entity::find()
            .filter(card::Column::UserId.eq(member.user_id))
            .filter(card::Column::State.eq(CardState::Active))
            .one(self.pool.as_ref())
            .await?;

        // 只换发访问令牌，刷新令牌沿用到自身过期
        let mut response = self.issue_tokens(member, active_card)?;
        response.refresh_token = refresh_token.to_string();
        Ok(response)
    }

    pub async fn me(&self, user_id: i64) -> AppResult<MeResponse> {
        let member = user::Entity::find_by_id(user_id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(MeResponse {
            id: member.user_id,
            username: member.username,
            full_name: member.full_name,
            email: member.email,
            phone: member.phone,
            address: member.address,
            role: member.role,
        })
    }

    fn issue_tokens(
        &self,
        member: user::Model,
        active_card: Option<card::Model>,
    ) -> AppResult<AuthResponse> {
        let role = member.role.to_string();
        let card_code = active_card.as_ref().map(|c| c.card_code.as_str());

        let access_token = self.jwt_service.generate_access_token(
            member.user_id,
            &member.username,
            &role,
            card_code,
        )?;
        let refresh_token = self.jwt_service.generate_refresh_token(
            member.user_id,
            &member.username,
            &role,
            card_code,
        )?;

        Ok(AuthResponse {
            user: UserInfo {
                id: member.user_id,
                username: member.username,
                full_name: member.full_name,
                email: member.email,
                phone: member.phone,
                address: member.address,
                role: member.role,
                card_id: active_card.as_ref().map(|c| c.card_id),
                card_code: active_card.map(|c| c.card_code),
            },
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}
