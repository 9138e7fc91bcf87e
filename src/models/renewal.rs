use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::payments::PaymentMethod;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanResponse {
    pub plan_id: i64,
    pub plan_name: String,
    pub duration_months: i32,
    pub price: i64,
    pub description: Option<String>,
}

impl From<crate::entities::plans::Model> for PlanResponse {
    fn from(plan: crate::entities::plans::Model) -> Self {
        Self {
            plan_id: plan.plan_id,
            plan_name: plan.name,
            duration_months: plan.duration_months,
            price: plan.price,
            description: plan.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenewalRequest {
    #[schema(example = 1)]
    pub plan_id: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenewalResponse {
    pub plan_name: String,
    pub amount: i64,
    pub payment_id: i64,
    pub subscription_id: i64,
    /// 柜台渠道需要前台确认，网关渠道由回调确认
    pub requires_confirmation: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VnpayCreateRequest {
    #[schema(example = 1)]
    pub plan_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VnpayCreateResponse {
    pub payment_id: i64,
    pub amount: i64,
    pub plan_name: String,
    pub subscription_id: i64,
}
