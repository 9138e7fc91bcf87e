use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::cards::CardState;
use crate::entities::subscriptions::SubscriptionStatus;
use crate::entities::users::UserRole;
use crate::entities::{
    card_entity as card, plan_entity as plan, points_transaction_entity as pt,
    subscription_entity as sub, user_entity as user,
};
use crate::error::{AppError, AppResult};
use crate::models::*;

#[derive(Clone)]
pub struct MemberService {
    pool: DatabaseConnection,
}

impl MemberService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<ProfileResponse> {
        let member = user::Entity::find_by_id(user_id)
            .filter(user::Column::DeletedAt.is_null())
            .filter(user::Column::Role.eq(UserRole::Member))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        Ok(ProfileResponse {
            id: member.user_id,
            username: member.username,
            full_name: member.full_name,
            email: member.email,
            phone: member.phone,
            address: member.address,
            status: member.status,
            created_at: member.created_at,
            updated_at: member.updated_at,
        })
    }

    pub async fn get_card(&self, user_id: i64) -> AppResult<Option<CardResponse>> {
        let active_card = card::Entity::find()
            .filter(card::Column::UserId.eq(user_id))
            .filter(card::Column::State.eq(CardState::Active))
            .one(&self.pool)
            .await?;

        Ok(active_card.map(CardResponse::from))
    }

    /// 当前生效套餐，按开始时间取最近一条
    pub async fn get_package(&self, user_id: i64) -> AppResult<Option<PackageResponse>> {
        let subscription = sub::Entity::find()
            .filter(sub::Column::MemberId.eq(user_id))
            .filter(sub::Column::Status.eq(SubscriptionStatus::Active))
            .order_by_desc(sub::Column::StartDate)
            .one(&self.pool)
            .await?;

        let Some(subscription) = subscription else {
            return Ok(None);
        };

        let Some(sub_plan) = plan::Entity::find_by_id(subscription.plan_id)
            .one(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let days_remaining = (subscription.end_date - Utc::now()).num_days();

        Ok(Some(PackageResponse {
            subscription_id: subscription.sub_id,
            plan_id: sub_plan.plan_id,
            plan_name: sub_plan.name,
            duration_months: sub_plan.duration_months,
            price: sub_plan.price,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            status: subscription.status,
            days_remaining,
        }))
    }

    pub async fn get_points(&self, user_id: i64) -> AppResult<PointsResponse> {
        let points = user::Entity::find_by_id(user_id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.pool)
            .await?
            .map(|u| u.points)
            .unwrap_or(0);

        Ok(PointsResponse { points })
    }

    pub async fn get_points_history(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PointsHistoryItem>> {
        let total = pt::Entity::find()
            .filter(pt::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await?;

        let rows = pt::Entity::find()
            .filter(pt::Column::UserId.eq(user_id))
            .order_by_desc(pt::Column::CreatedAt)
            .offset(params.offset())
            .limit(params.limit())
            .all(&self.pool)
            .await?;

        let data = rows.into_iter().map(PointsHistoryItem::from).collect();
        Ok(PaginatedResponse::new(
            data,
            params.page(),
            params.limit(),
            total,
        ))
    }
}
