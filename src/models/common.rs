//! 错误响应的公共结构

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 所有接口出错时统一返回 `{"success": false, "error": {...}}`，
/// 这里是 error 字段的结构。
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}
