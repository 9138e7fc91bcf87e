use chrono::{Months, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::payments::{PaymentMethod, PaymentStatus};
use crate::entities::points_transactions::PointsTransactionType;
use crate::entities::rewards::RewardType;
use crate::entities::subscriptions::SubscriptionStatus;
use crate::entities::{
    payment_entity as payment, plan_entity as plan, points_transaction_entity as pt,
    reward_entity as reward, subscription_entity as sub, user_entity as user,
};
use crate::error::{AppError, AppResult};
use crate::models::{RedeemResponse, RewardResponse};
use crate::utils::generate_invoice_no;

#[derive(Clone)]
pub struct RewardService {
    pool: DatabaseConnection,
}

impl RewardService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 可兑换的奖励目录，按所需积分从低到高
    pub async fn list_rewards(&self) -> AppResult<Vec<RewardResponse>> {
        let rewards = reward::Entity::find()
            .filter(reward::Column::Active.eq(true))
            .filter(reward::Column::DeletedAt.is_null())
            .order_by_asc(reward::Column::PointsRequired)
            .all(&self.pool)
            .await?;

        Ok(rewards.into_iter().map(RewardResponse::from).collect())
    }

    /// 单个奖励详情。未删除即可见，下架与否由调用方判断
    pub async fn get_reward(&self, reward_id: i64) -> AppResult<RewardResponse> {
        let item = reward::Entity::find_by_id(reward_id)
            .filter(reward::Column::DeletedAt.is_null())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Reward not found".to_string()))?;

        Ok(RewardResponse::from(item))
    }

    /// 积分兑换。扣减余额、库存、流水和订阅开通在同一事务内，
    /// 会员行持锁避免并发兑换把积分扣成负数。
    pub async fn redeem(&self, user_id: i64, reward_id: i64) -> AppResult<RedeemResponse> {
        let txn = self.pool.begin().await?;

        let item = reward::Entity::find_by_id(reward_id)
            .filter(reward::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Reward not found".to_string()))?;
        if !item.active {
            return Err(AppError::NotFound("Reward not found".to_string()));
        }

        let member = user::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if member.points < item.points_required {
            return Err(AppError::InsufficientPoints);
        }
        if let Some(quantity) = item.quantity
            && quantity <= 0
        {
            return Err(AppError::OutOfStock);
        }

        let mut subscription_id = None;
        let mut plan_name = None;

        if item.reward_type == RewardType::Subscription {
            let plan_id = item
                .related_plan_id
                .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;
            let reward_plan = plan::Entity::find_by_id(plan_id)
                .filter(plan::Column::DeletedAt.is_null())
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

            let sub_id = grant_subscription(&txn, user_id, &reward_plan).await?;

            // 兑换开通的订阅记一笔零元支付单，保持对账口径一致
            payment::ActiveModel {
                sub_id: Set(sub_id),
                amount: Set(0),
                method: Set(PaymentMethod::Cash),
                payment_status: Set(PaymentStatus::Success),
                invoice_no: Set(generate_invoice_no()),
                cashier_id: Set(Some(user_id)),
                payment_date: Set(Some(Utc::now())),
                created_at: Set(Some(Utc::now())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            subscription_id = Some(sub_id);
            plan_name = Some(reward_plan.name);
        }

        let remaining_points = member.points - item.points_required;
        let mut member_am = member.into_active_model();
        member_am.points = Set(remaining_points);
        member_am.update(&txn).await?;

        if item.quantity.is_some() {
            let mut reward_am = item.clone().into_active_model();
            reward_am.quantity = Set(item.quantity.map(|q| q - 1));
            reward_am.update(&txn).await?;
        }

        let description = match &plan_name {
            Some(name) => format!("Đổi quà: {} - Gói: {}", item.name, name),
            None => format!("Đổi quà: {}", item.name),
        };

        pt::ActiveModel {
            user_id: Set(user_id),
            transaction_type: Set(PointsTransactionType::Redeemed),
            points: Set(-item.points_required),
            description: Set(description),
            related_subscription_id: Set(subscription_id),
            created_by: Set(user_id),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "User {} redeemed reward {} for {} points",
            user_id,
            reward_id,
            item.points_required
        );

        Ok(RedeemResponse {
            reward_name: item.name,
            points_used: item.points_required,
            remaining_points,
            subscription_id,
            plan_name,
        })
    }
}

/// 兑换型奖励的订阅发放：有生效订阅则顺延有效期，否则立即开通新订阅
async fn grant_subscription(
    txn: &sea_orm::DatabaseTransaction,
    member_id: i64,
    reward_plan: &plan::Model,
) -> AppResult<i64> {
    let months = Months::new(reward_plan.duration_months.max(0) as u32);

    let active = sub::Entity::find()
        .filter(sub::Column::MemberId.eq(member_id))
        .filter(sub::Column::Status.eq(SubscriptionStatus::Active))
        .order_by_desc(sub::Column::EndDate)
        .one(txn)
        .await?;

    if let Some(current) = active {
        let sub_id = current.sub_id;
        let extended = current
            .end_date
            .checked_add_months(months)
            .ok_or_else(|| AppError::InternalError("Invalid subscription period".to_string()))?;

        let mut sub_am = current.into_active_model();
        sub_am.end_date = Set(extended);
        sub_am.update(txn).await?;

        return Ok(sub_id);
    }

    let now = Utc::now();
    let end_date = now
        .checked_add_months(months)
        .ok_or_else(|| AppError::InternalError("Invalid subscription period".to_string()))?;

    let created = sub::ActiveModel {
        member_id: Set(member_id),
        plan_id: Set(reward_plan.plan_id),
        start_date: Set(now),
        end_date: Set(end_date),
        status: Set(SubscriptionStatus::Active),
        created_by: Set(member_id),
        created_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(created.sub_id)
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::entities::users::{UserRole, UserStatus};

    fn test_reward(points_required: i64, quantity: Option<i32>, active: bool) -> reward::Model {
        reward::Model {
            reward_id: 1,
            name: "Bình nước thể thao".to_string(),
            description: None,
            points_required,
            reward_type: RewardType::Generic,
            related_plan_id: None,
            quantity,
            active,
            deleted_at: None,
            created_at: None,
        }
    }

    fn test_member(points: i64) -> user::Model {
        user::Model {
            user_id: 5,
            username: "member5".to_string(),
            full_name: "Trần Văn B".to_string(),
            email: None,
            phone: None,
            address: None,
            role: UserRole::Member,
            status: UserStatus::Active,
            password_hash: None,
            points,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_redeem_rejects_insufficient_points() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_reward(500, None, true)]])
            .append_query_results([vec![test_member(100)]])
            .into_connection();
        let service = RewardService::new(db);

        let err = service.redeem(5, 1).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientPoints));
    }

    #[tokio::test]
    async fn test_redeem_rejects_depleted_stock() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_reward(100, Some(0), true)]])
            .append_query_results([vec![test_member(1000)]])
            .into_connection();
        let service = RewardService::new(db);

        let err = service.redeem(5, 1).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfStock));
    }

    #[tokio::test]
    async fn test_redeem_rejects_inactive_reward() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_reward(100, None, false)]])
            .into_connection();
        let service = RewardService::new(db);

        let err = service.redeem(5, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
