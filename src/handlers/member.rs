use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::MemberService;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/api/v1/member/profile",
    tag = "member",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取会员资料成功", body = ProfileResponse),
        (status = 401, description = "未授权"),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn get_profile(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match member_service.get_profile(user_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/member/card",
    tag = "member",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取会员卡成功", body = CardResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_card(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match member_service.get_card(user_id).await {
        // 没有生效中的卡不算错误，data 置空并附带说明
        Ok(Some(card)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": card
        }))),
        Ok(None) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null,
            "message": "No active card found"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/member/package",
    tag = "member",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取当前套餐成功", body = PackageResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_package(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match member_service.get_package(user_id).await {
        Ok(Some(package)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": package
        }))),
        Ok(None) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null,
            "message": "No active package found"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/member/points",
    tag = "member",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取积分余额成功", body = PointsResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_points(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match member_service.get_points(user_id).await {
        Ok(points) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": points
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/member/points/history",
    tag = "member",
    params(
        ("page" = Option<u64>, Query, description = "页码"),
        ("limit" = Option<u64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取积分流水成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_points_history(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match member_service
        .get_points_history(user_id, &query.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn member_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/member")
            .route("/profile", web::get().to(get_profile))
            .route("/card", web::get().to(get_card))
            .route("/package", web::get().to(get_package))
            .route("/points", web::get().to(get_points))
            .route("/points/history", web::get().to(get_points_history)),
    );
}
