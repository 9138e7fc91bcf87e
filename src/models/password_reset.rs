use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    #[schema(example = "member@example.com")]
    pub email_or_phone: String,
}

/// contact_info 是实际送达的渠道，手机号已脱敏
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetRequestResponse {
    pub user_id: i64,
    pub contact_info: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetVerifyRequest {
    pub user_id: i64,
    #[schema(example = "482913")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetResetRequest {
    pub user_id: i64,
    #[schema(example = "482913")]
    pub code: String,
    #[schema(example = "newpassword123")]
    pub new_password: String,
}
