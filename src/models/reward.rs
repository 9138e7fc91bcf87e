use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::rewards::RewardType;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RewardResponse {
    pub reward_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub points_required: i64,
    pub reward_type: RewardType,
    pub related_plan_id: Option<i64>,
    /// None 表示不限量
    pub quantity: Option<i32>,
    pub active: bool,
}

impl From<crate::entities::rewards::Model> for RewardResponse {
    fn from(reward: crate::entities::rewards::Model) -> Self {
        Self {
            reward_id: reward.reward_id,
            name: reward.name,
            description: reward.description,
            points_required: reward.points_required,
            reward_type: reward.reward_type,
            related_plan_id: reward.related_plan_id,
            quantity: reward.quantity,
            active: reward.active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemRequest {
    #[schema(example = 1)]
    pub reward_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemResponse {
    pub reward_name: String,
    pub points_used: i64,
    pub remaining_points: i64,
    pub subscription_id: Option<i64>,
    pub plan_name: Option<String>,
}
