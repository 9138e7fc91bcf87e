use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::models::*;
use crate::services::ForgotCardService;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/api/v1/forgot-card/request",
    tag = "forgot-card",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "通行码签发成功", body = ForgotCardRequestResponse),
        (status = 404, description = "会员不存在"),
        (status = 429, description = "当日申请次数超限")
    )
)]
pub async fn request_passcode(
    forgot_card_service: web::Data<ForgotCardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match forgot_card_service.request_passcode(user_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Passcode created successfully",
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/forgot-card/verify",
    tag = "forgot-card",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "验证码核验通过", body = ForgotCardRequestResponse),
        (status = 400, description = "验证码无效或已过期")
    )
)]
pub async fn verify_code(
    forgot_card_service: web::Data<ForgotCardService>,
    request: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse> {
    if request.code.is_empty() {
        let error = AppError::ValidationError(
            "User ID and verification code are required".to_string(),
        );
        return Ok(error.error_response());
    }

    match forgot_card_service
        .verify_code(request.user_id, &request.code)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Verification code verified successfully",
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/forgot-card/passcode",
    tag = "forgot-card",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "查询当前通行码成功", body = PasscodeResponse),
        (status = 404, description = "没有可用的通行码")
    )
)]
pub async fn active_passcode(
    forgot_card_service: web::Data<ForgotCardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match forgot_card_service.active_passcode(user_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/forgot-card/validate",
    tag = "forgot-card",
    request_body = ValidatePasscodeRequest,
    responses(
        (status = 200, description = "闸机核销成功", body = GateValidationResponse),
        (status = 400, description = "缺少通行码"),
        (status = 404, description = "通行码无效或已过期")
    )
)]
pub async fn validate_passcode(
    forgot_card_service: web::Data<ForgotCardService>,
    request: web::Json<ValidatePasscodeRequest>,
) -> Result<HttpResponse> {
    if request.passcode.is_empty() {
        let error = AppError::ValidationError("Passcode is required".to_string());
        return Ok(error.error_response());
    }

    match forgot_card_service.validate_at_gate(&request.passcode).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn forgot_card_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/forgot-card")
            .route("/request", web::post().to(request_passcode))
            .route("/verify", web::post().to(verify_code))
            .route("/passcode", web::get().to(active_passcode))
            .route("/validate", web::post().to(validate_passcode)),
    );
}
