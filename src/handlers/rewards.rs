use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::RewardService;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/api/v1/rewards",
    tag = "rewards",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取奖励目录成功", body = [RewardResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_rewards(reward_service: web::Data<RewardService>) -> Result<HttpResponse> {
    match reward_service.list_rewards().await {
        Ok(rewards) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": rewards
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/rewards/{reward_id}",
    tag = "rewards",
    params(
        ("reward_id" = i64, Path, description = "奖励编号")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取奖励详情成功", body = RewardResponse),
        (status = 404, description = "奖励不存在")
    )
)]
pub async fn get_reward(
    reward_service: web::Data<RewardService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match reward_service.get_reward(path.into_inner()).await {
        Ok(reward) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": reward
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/rewards/redeem",
    tag = "rewards",
    request_body = RedeemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑换成功", body = RedeemResponse),
        (status = 400, description = "积分不足或已无库存"),
        (status = 404, description = "奖励不存在")
    )
)]
pub async fn redeem(
    reward_service: web::Data<RewardService>,
    req: HttpRequest,
    request: web::Json<RedeemRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match reward_service.redeem(user_id, request.reward_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Đổi quà thành công",
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn rewards_config(cfg: &mut web::ServiceConfig) {
    // /redeem 注册在 /{reward_id} 之前，避免被路径参数吞掉
    cfg.service(
        web::scope("/rewards")
            .route("", web::get().to(list_rewards))
            .route("/redeem", web::post().to(redeem))
            .route("/{reward_id}", web::get().to(get_reward)),
    );
}
