use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::cards::CardState;
use crate::entities::points_transactions::PointsTransactionType;
use crate::entities::subscriptions::SubscriptionStatus;
use crate::entities::users::UserStatus;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: UserStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CardResponse {
    pub card_id: i64,
    pub card_code: String,
    pub state: CardState,
    pub issue_date: DateTime<Utc>,
    pub expire_date: Option<DateTime<Utc>>,
}

impl From<crate::entities::cards::Model> for CardResponse {
    fn from(card: crate::entities::cards::Model) -> Self {
        Self {
            card_id: card.card_id,
            card_code: card.card_code,
            state: card.state,
            issue_date: card.issue_date,
            expire_date: card.expire_date,
        }
    }
}

/// 会员当前生效的套餐
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageResponse {
    pub subscription_id: i64,
    pub plan_id: i64,
    pub plan_name: String,
    pub duration_months: i32,
    pub price: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub days_remaining: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PointsResponse {
    pub points: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PointsHistoryItem {
    pub transaction_id: i64,
    pub transaction_type: PointsTransactionType,
    pub points: i64,
    pub description: String,
    pub related_subscription_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<crate::entities::points_transactions::Model> for PointsHistoryItem {
    fn from(tx: crate::entities::points_transactions::Model) -> Self {
        Self {
            transaction_id: tx.transaction_id,
            transaction_type: tx.transaction_type,
            points: tx.points,
            description: tx.description,
            related_subscription_id: tx.related_subscription_id,
            created_at: tx.created_at,
        }
    }
}
