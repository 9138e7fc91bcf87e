use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForgotCardRequestResponse {
    pub passcode: String,
    pub expires_at: DateTime<Utc>,
}

/// 核验走免认证通道，请求体里带用户标识
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeRequest {
    #[schema(example = 5)]
    pub user_id: i64,
    #[schema(example = "482913")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasscodeResponse {
    pub passcode: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidatePasscodeRequest {
    #[schema(example = "K7MPQ2XA")]
    pub passcode: String,
}

/// 闸机核验结果，带上会员与卡的身份信息
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GateValidationResponse {
    pub valid: bool,
    pub user_id: i64,
    pub username: String,
    pub member_name: String,
    pub card_id: Option<i64>,
    pub card_code: Option<String>,
}
