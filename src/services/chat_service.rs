use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::users::{UserRole, UserStatus};
use crate::entities::{chat_message_entity as chat, user_entity as user};
use crate::error::{AppError, AppResult};
use crate::models::*;

/// 内联附件上限
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// 待入库的一条消息，file_size 由 file_data 长度推出
pub struct NewChatMessage {
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub file_data: Option<Vec<u8>>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}

/// 解码 base64 附件并限制大小，入库前调用
pub fn decode_attachment(file_data: &str) -> AppResult<Vec<u8>> {
    let bytes = general_purpose::STANDARD
        .decode(file_data)
        .map_err(|_| AppError::ValidationError("Invalid base64 file data".to_string()))?;
    if bytes.len() > MAX_FILE_SIZE {
        return Err(AppError::FileTooLarge);
    }
    Ok(bytes)
}

#[derive(Clone)]
pub struct ChatService {
    pool: Arc<DatabaseConnection>,
}

impl ChatService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// 会员与值班前台之间的双向历史，按时间正序
    pub async fn get_history(
        &self,
        user_id: i64,
        limit: u64,
    ) -> AppResult<Vec<ChatMessageResponse>> {
        let Some(username) = self.username_by_user_id(user_id).await? else {
            return Ok(Vec::new());
        };
        let receptionist = self.active_receptionist_username().await;

        let pair = Condition::any()
            .add(
                Condition::all()
                    .add(chat::Column::Sender.eq(username.clone()))
                    .add(chat::Column::Receiver.eq(receptionist.clone())),
            )
            .add(
                Condition::all()
                    .add(chat::Column::Sender.eq(receptionist))
                    .add(chat::Column::Receiver.eq(username)),
            );

        let rows = chat::Entity::find()
            .filter(pair)
            .order_by_asc(chat::Column::CreatedAt)
            .limit(limit)
            .all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(into_response).collect())
    }

    pub async fn save_message(&self, msg: NewChatMessage) -> AppResult<()> {
        let file_size = msg.file_data.as_ref().map(|b| b.len() as i64);
        log::debug!(
            "Storing chat message {} -> {} ({} bytes attachment)",
            msg.sender,
            msg.receiver,
            file_size.unwrap_or(0)
        );

        chat::ActiveModel {
            sender: Set(msg.sender),
            receiver: Set(msg.receiver),
            message: Set(msg.message),
            file_data: Set(msg.file_data),
            file_path: Set(msg.file_path),
            file_name: Set(msg.file_name),
            file_type: Set(msg.file_type),
            file_size: Set(file_size),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        Ok(())
    }

    pub async fn username_by_user_id(&self, user_id: i64) -> AppResult<Option<String>> {
        Ok(user::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .map(|u| u.username))
    }

    /// 值班前台账号名，查不到时退回到固定的 "receptionist"
    pub async fn active_receptionist_username(&self) -> String {
        let found = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Receptionist))
            .filter(user::Column::Status.eq(UserStatus::Active))
            .one(self.pool.as_ref())
            .await;

        match found {
            Ok(Some(receptionist)) => receptionist.username,
            Ok(None) => "receptionist".to_string(),
            Err(e) => {
                log::warn!("Failed to resolve active receptionist: {e}");
                "receptionist".to_string()
            }
        }
    }
}

/// 内联附件重新编码为 data URL 交给前端展示
fn into_response(msg: chat::Model) -> ChatMessageResponse {
    let file_data = msg.file_data.map(|bytes| {
        let mime = msg
            .file_type
            .clone()
            .unwrap_or_else(|| "image/png".to_string());
        format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
    });

    ChatMessageResponse {
        sender: msg.sender,
        receiver: msg.receiver,
        message: msg.message,
        file_data,
        file_path: msg.file_path,
        file_name: msg.file_name,
        file_type: msg.file_type,
        file_size: msg.file_size,
        timestamp: msg.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_attachment_roundtrip() {
        let encoded = general_purpose::STANDARD.encode(b"hello");
        assert_eq!(decode_attachment(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_attachment_rejects_invalid_base64() {
        assert!(matches!(
            decode_attachment("not base64!!!"),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_decode_attachment_rejects_oversized() {
        let encoded = general_purpose::STANDARD.encode(vec![0u8; MAX_FILE_SIZE + 1]);
        assert!(matches!(
            decode_attachment(&encoded),
            Err(AppError::FileTooLarge)
        ));
    }
}
