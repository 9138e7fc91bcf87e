use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::models::*;
use crate::services::PasswordResetService;

#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/request",
    tag = "password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "验证码已发送", body = PasswordResetRequestResponse),
        (status = 404, description = "账号不存在"),
        (status = 502, description = "验证码投递失败")
    )
)]
pub async fn request_reset(
    password_reset_service: web::Data<PasswordResetService>,
    request: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse> {
    if request.email_or_phone.is_empty() {
        let error =
            AppError::ValidationError("Email hoặc số điện thoại là bắt buộc".to_string());
        return Ok(error.error_response());
    }

    match password_reset_service
        .request_reset(&request.email_or_phone)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Mã xác nhận đã được gửi",
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/verify",
    tag = "password-reset",
    request_body = PasswordResetVerifyRequest,
    responses(
        (status = 200, description = "验证码有效"),
        (status = 400, description = "验证码无效或已过期")
    )
)]
pub async fn verify_reset_code(
    password_reset_service: web::Data<PasswordResetService>,
    request: web::Json<PasswordResetVerifyRequest>,
) -> Result<HttpResponse> {
    if request.code.is_empty() {
        let error =
            AppError::ValidationError("User ID và mã xác nhận là bắt buộc".to_string());
        return Ok(error.error_response());
    }

    match password_reset_service
        .verify_code(request.user_id, &request.code)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Mã xác nhận hợp lệ"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/reset",
    tag = "password-reset",
    request_body = PasswordResetResetRequest,
    responses(
        (status = 200, description = "密码重置成功"),
        (status = 400, description = "验证码无效或密码不符合要求")
    )
)]
pub async fn reset_password(
    password_reset_service: web::Data<PasswordResetService>,
    request: web::Json<PasswordResetResetRequest>,
) -> Result<HttpResponse> {
    if request.code.is_empty() || request.new_password.is_empty() {
        let error =
            AppError::ValidationError("Thông tin đặt lại mật khẩu không đầy đủ".to_string());
        return Ok(error.error_response());
    }

    match password_reset_service
        .reset_password(request.user_id, &request.code, &request.new_password)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Đặt lại mật khẩu thành công"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn password_reset_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth/password-reset")
            .route("/request", web::post().to(request_reset))
            .route("/verify", web::post().to(verify_reset_code))
            .route("/reset", web::post().to(reset_password)),
    );
}
