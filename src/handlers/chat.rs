use std::collections::HashMap;

use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use actix_ws::{Message, MessageStream, Session};
use chrono::Utc;
use futures_util::StreamExt as _;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::*;
use crate::services::{ChatService, NewChatMessage, PresenceRegistry, decode_attachment};
use crate::utils::JwtService;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/api/v1/chat/messages",
    tag = "chat",
    params(
        ("limit" = Option<u64>, Query, description = "返回条数，默认 50")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "与值班前台的聊天历史", body = Vec<ChatMessageResponse>),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_messages(
    chat_service: web::Data<ChatService>,
    req: HttpRequest,
    query: web::Query<ChatHistoryQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match chat_service.get_history(user_id, query.limit()).await {
        Ok(messages) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": messages
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/chat/messages",
    tag = "chat",
    request_body = SendMessageRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "消息已保存"),
        (status = 400, description = "消息为空或附件不合法"),
        (status = 401, description = "未授权")
    )
)]
pub async fn send_message(
    chat_service: web::Data<ChatService>,
    req: HttpRequest,
    request: web::Json<SendMessageRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let request = request.into_inner();

    let has_text = request.message.as_deref().is_some_and(|m| !m.is_empty());
    if !has_text && request.file_data.is_none() && request.file_path.is_none() {
        return Ok(
            AppError::ValidationError("Message or file is required".to_string()).error_response(),
        );
    }

    let sender = match chat_service.username_by_user_id(user_id).await {
        Ok(Some(username)) => username,
        Ok(None) => return Ok(AppError::NotFound("User not found".to_string()).error_response()),
        Err(e) => return Ok(e.error_response()),
    };

    // 未指定收件人时发给值班前台
    let receiver = match request.receiver.filter(|r| !r.is_empty()) {
        Some(receiver) => receiver,
        None => chat_service.active_receptionist_username().await,
    };

    let file_data = match request.file_data.as_deref().map(decode_attachment).transpose() {
        Ok(bytes) => bytes,
        Err(e) => return Ok(e.error_response()),
    };

    let stored = NewChatMessage {
        sender,
        receiver,
        message: request.message.unwrap_or_default(),
        file_data,
        file_path: request.file_path,
        file_name: request.file_name,
        file_type: request.file_type,
    };

    match chat_service.save_message(stored).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Message saved successfully"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/chat/receptionist",
    tag = "chat",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前值班前台账号", body = ReceptionistResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_receptionist(chat_service: web::Data<ChatService>) -> Result<HttpResponse> {
    let username = chat_service.active_receptionist_username().await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": ReceptionistResponse { username }
    })))
}

/// WebSocket 握手。中间件对 /ws/chat 放行，
/// 令牌从 query 里取并在升级前校验，拿不到合法令牌不升级。
#[utoipa::path(
    get,
    path = "/ws/chat",
    tag = "chat",
    params(
        ("token" = String, Query, description = "访问令牌")
    ),
    responses(
        (status = 101, description = "协议升级成功"),
        (status = 401, description = "令牌缺失或无效")
    )
)]
pub async fn ws_chat(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<HashMap<String, String>>,
    jwt_service: web::Data<JwtService>,
    chat_service: web::Data<ChatService>,
    presence: web::Data<PresenceRegistry>,
) -> Result<HttpResponse> {
    let Some(token) = query.get("token") else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };
    let claims = match jwt_service.verify_access_token(token) {
        Ok(claims) => claims,
        Err(_) => {
            return Ok(AppError::AuthError("Invalid access token".to_string()).error_response());
        }
    };

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    let username = claims.username;
    let conn_id = presence.register(&username, session.clone());
    log::info!(
        "User {} connected to chat ({} online)",
        username,
        presence.online_count()
    );

    actix_web::rt::spawn(run_session(
        session,
        msg_stream,
        username,
        conn_id,
        chat_service.get_ref().clone(),
        presence.get_ref().clone(),
    ));

    Ok(response)
}

async fn run_session(
    mut session: Session,
    mut msg_stream: MessageStream,
    username: String,
    conn_id: Uuid,
    chat_service: ChatService,
    presence: PresenceRegistry,
) {
    while let Some(Ok(msg)) = msg_stream.next().await {
        match msg {
            Message::Text(text) => {
                let delivered =
                    handle_client_frame(&mut session, &text, &username, &chat_service, &presence)
                        .await;
                if delivered.is_err() {
                    break;
                }
            }
            Message::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    presence.unregister(&username, conn_id);
    log::info!(
        "User {} disconnected from chat ({} online)",
        username,
        presence.online_count()
    );
    let _ = session.close(None).await;
}

/// 处理一帧客户端事件，Err 表示本端连接已断开
async fn handle_client_frame(
    session: &mut Session,
    text: &str,
    username: &str,
    chat_service: &ChatService,
    presence: &PresenceRegistry,
) -> std::result::Result<(), actix_ws::Closed> {
    let event = match serde_json::from_str::<WsClientEvent>(text) {
        Ok(event) => event,
        Err(_) => return send_error(session, "Invalid message format").await,
    };

    if event.event != "private_message" {
        return send_error(session, "Unsupported event").await;
    }

    let has_text = event.message.as_deref().is_some_and(|m| !m.is_empty());
    if !has_text && event.file_data.is_none() {
        return send_error(session, "Message or file is required").await;
    }

    let receiver = match event.to.clone().filter(|t| !t.is_empty()) {
        Some(receiver) => receiver,
        None => chat_service.active_receptionist_username().await,
    };

    let decoded = match event.file_data.as_deref().map(decode_attachment).transpose() {
        Ok(bytes) => bytes,
        Err(e) => return send_error(session, &e.to_string()).await,
    };

    let stored = NewChatMessage {
        sender: username.to_string(),
        receiver: receiver.clone(),
        message: event.message.clone().unwrap_or_default(),
        file_data: decoded,
        file_path: None,
        file_name: event.file_name.clone(),
        file_type: event.file_type.clone(),
    };
    if let Err(e) = chat_service.save_message(stored).await {
        log::error!("Failed to store chat message from {}: {}", username, e);
        return send_error(session, "Failed to store message").await;
    }

    // 对方在线就实时推送；不在线消息已入库，等拉历史时补齐
    if let Some(mut peer) = presence.lookup(&receiver) {
        let file_data = event.file_data.as_ref().map(|data| {
            let mime = event
                .file_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            format!("data:{};base64,{}", mime, data)
        });
        let pushed = json!({
            "event": "private_message",
            "from": username,
            "to": receiver,
            "message": event.message.unwrap_or_default(),
            "file_data": file_data,
            "file_name": event.file_name,
            "file_type": event.file_type,
            "timestamp": Utc::now(),
        });
        if peer.text(pushed.to_string()).await.is_err() {
            log::debug!("Receiver {} dropped before delivery", receiver);
        }
    }

    session
        .text(json!({ "event": "message_sent", "success": true }).to_string())
        .await
}

async fn send_error(
    session: &mut Session,
    message: &str,
) -> std::result::Result<(), actix_ws::Closed> {
    session
        .text(json!({ "event": "message_error", "error": message }).to_string())
        .await
}

pub fn chat_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chat")
            .route("/messages", web::get().to(get_messages))
            .route("/messages", web::post().to(send_message))
            .route("/receptionist", web::get().to(get_receptionist)),
    );
}

pub fn ws_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws/chat", web::get().to(ws_chat));
}
