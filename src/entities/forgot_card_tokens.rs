use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 挂失补办通行码。核验通过后签发 8 位临时通行码，闸机验证时核销。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "forgot_card_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub token_id: i64,
    pub user_id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// 6 位验证码，已登录自助申领时为空
    pub verification_code: Option<String>,
    pub passcode: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
