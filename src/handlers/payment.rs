use std::collections::HashMap;

use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::PaymentService;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/payment/vnpay/callback",
    tag = "payment",
    responses(
        (status = 302, description = "处理完成后跳转到支付结果页")
    )
)]
pub async fn vnpay_callback(
    payment_service: web::Data<PaymentService>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse> {
    let outcome = payment_service.handle_vnpay_callback(&query).await;
    let location = format!(
        "{}?{}",
        payment_service.result_url(),
        outcome.to_redirect_query()
    );

    Ok(HttpResponse::Found()
        .append_header(("Location", location))
        .finish())
}

#[utoipa::path(
    post,
    path = "/payment/vnpay/ipn",
    tag = "payment",
    responses(
        (status = 200, description = "网关应答，RspCode 标识处理结果", body = IpnResponse)
    )
)]
pub async fn vnpay_ipn(
    payment_service: web::Data<PaymentService>,
    params: web::Json<HashMap<String, String>>,
) -> Result<HttpResponse> {
    // 服务器间通知固定应答 200，处理结果放在 RspCode 里
    let response = payment_service.handle_vnpay_ipn(&params).await;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/payment/vnpay/create-url",
    tag = "payment",
    request_body = VnpayCreateUrlRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "签发支付跳转链接成功", body = VnpayCreateUrlResponse),
        (status = 400, description = "金额与支付单不符"),
        (status = 404, description = "支付单不存在")
    )
)]
pub async fn create_vnpay_url(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<VnpayCreateUrlRequest>,
) -> Result<HttpResponse> {
    let connection_info = req.connection_info().clone();
    let client_ip = connection_info.realip_remote_addr().unwrap_or("127.0.0.1");

    match payment_service
        .create_vnpay_url(request.into_inner(), client_ip)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/payment/vnpay/status/{payment_id}",
    tag = "payment",
    params(
        ("payment_id" = i64, Path, description = "支付单号")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "查询支付状态成功", body = VnpayStatusResponse),
        (status = 404, description = "支付单不存在")
    )
)]
pub async fn vnpay_status(
    payment_service: web::Data<PaymentService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match payment_service.get_vnpay_status(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/payment/confirm/{payment_id}",
    tag = "payment",
    params(
        ("payment_id" = i64, Path, description = "支付单号")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "柜台支付确认成功", body = ConfirmPaymentResponse),
        (status = 403, description = "仅前台可确认"),
        (status = 400, description = "支付单已是终态"),
        (status = 404, description = "支付单不存在")
    )
)]
pub async fn confirm_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let staff_user_id = get_user_id_from_request(&req).unwrap_or(0);

    match payment_service
        .confirm_payment_by_staff(path.into_inner(), staff_user_id)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Payment confirmed successfully",
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment")
            .route("/vnpay/callback", web::get().to(vnpay_callback))
            .route("/vnpay/ipn", web::post().to(vnpay_ipn))
            .route("/vnpay/create-url", web::post().to(create_vnpay_url))
            .route("/vnpay/status/{payment_id}", web::get().to(vnpay_status))
            .route("/confirm/{payment_id}", web::post().to(confirm_payment)),
    );
}
