use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 历史消息。file_data 为 data URL 形式的内联附件，
/// file_path 为外部存储引用，两者最多一个有值。
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageResponse {
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub file_data: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// 省略时默认发给值班前台
    pub receiver: Option<String>,
    pub message: Option<String>,
    /// base64 编码的附件内容
    pub file_data: Option<String>,
    /// 外部存储引用，与 file_data 二选一
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatHistoryQuery {
    pub limit: Option<u64>,
}

impl ChatHistoryQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceptionistResponse {
    pub username: String,
}

/// WebSocket 客户端事件
#[derive(Debug, Deserialize)]
pub struct WsClientEvent {
    pub event: String,
    pub to: Option<String>,
    pub message: Option<String>,
    pub file_data: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}
