use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::RenewalService;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/api/v1/member/renewal/plans",
    tag = "renewal",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取可续费套餐成功", body = [PlanResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_plans(renewal_service: web::Data<RenewalService>) -> Result<HttpResponse> {
    match renewal_service.list_plans().await {
        Ok(plans) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": plans
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/member/renewal/request",
    tag = "renewal",
    request_body = RenewalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "续费申请已受理", body = RenewalResponse),
        (status = 401, description = "未授权"),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn create_request(
    renewal_service: web::Data<RenewalService>,
    req: HttpRequest,
    request: web::Json<RenewalRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match renewal_service
        .create_renewal_request(user_id, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Yêu cầu gia hạn đã được gửi. Vui lòng thanh toán tại quầy và chờ xác nhận từ nhân viên.",
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/member/renewal/vnpay/create",
    tag = "renewal",
    request_body = VnpayCreateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "网关支付单已创建", body = VnpayCreateResponse),
        (status = 401, description = "未授权"),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn create_vnpay(
    renewal_service: web::Data<RenewalService>,
    req: HttpRequest,
    request: web::Json<VnpayCreateRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match renewal_service
        .create_vnpay_payment_request(user_id, request.plan_id)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "VNPay payment request created",
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn renewal_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/member/renewal")
            .route("/plans", web::get().to(list_plans))
            .route("/request", web::post().to(create_request))
            .route("/vnpay/create", web::post().to(create_vnpay)),
    );
}
