use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reset_code_type")]
#[serde(rename_all = "snake_case")]
pub enum ResetCodeType {
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "sms")]
    Sms,
}

impl std::fmt::Display for ResetCodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetCodeType::Email => write!(f, "email"),
            ResetCodeType::Sms => write!(f, "sms"),
        }
    }
}

/// 密码重置验证码。code_type 记录实际送达渠道，
/// 主渠道失败转备用渠道时会更新。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub token_id: i64,
    pub user_id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub reset_code: String,
    pub code_type: ResetCodeType,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
