use chrono::{Months, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::payments::{PaymentMethod, PaymentStatus};
use crate::entities::subscriptions::SubscriptionStatus;
use crate::entities::{
    payment_entity as payment, plan_entity as plan, subscription_entity as sub,
    user_entity as user,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::generate_invoice_no;

#[derive(Clone)]
pub struct RenewalService {
    pool: DatabaseConnection,
}

impl RenewalService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_plans(&self) -> AppResult<Vec<PlanResponse>> {
        let rows = plan::Entity::find()
            .filter(plan::Column::Active.eq(true))
            .filter(plan::Column::DeletedAt.is_null())
            .order_by_asc(plan::Column::DurationMonths)
            .all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PlanResponse::from).collect())
    }

    /// 柜台渠道的续费请求：挂起订阅 + Pending 支付单，等前台确认
    pub async fn create_renewal_request(
        &self,
        user_id: i64,
        request: RenewalRequest,
    ) -> AppResult<RenewalResponse> {
        let txn = self.pool.begin().await?;

        // 会员行锁串行化同一会员的并发续费
        let member = user::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let chosen_plan = plan::Entity::find_by_id(request.plan_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

        let sub_id = upsert_pending_subscription(&txn, member.user_id, &chosen_plan).await?;

        let new_payment = payment::ActiveModel {
            sub_id: Set(sub_id),
            amount: Set(chosen_plan.price),
            method: Set(request.payment_method.clone()),
            payment_status: Set(PaymentStatus::Pending),
            invoice_no: Set(generate_invoice_no()),
            cashier_id: Set(Some(user_id)),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Renewal request: user {} plan {} payment {} via {}",
            user_id,
            chosen_plan.plan_id,
            new_payment.payment_id,
            request.payment_method
        );

        Ok(RenewalResponse {
            plan_name: chosen_plan.name,
            amount: chosen_plan.price,
            payment_id: new_payment.payment_id,
            subscription_id: sub_id,
            requires_confirmation: request.payment_method.requires_confirmation(),
        })
    }

    /// 网关渠道的续费请求，返回签名建链所需的支付信息
    pub async fn create_vnpay_payment_request(
        &self,
        user_id: i64,
        plan_id: i64,
    ) -> AppResult<VnpayCreateResponse> {
        let txn = self.pool.begin().await?;

        let member = user::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let chosen_plan = plan::Entity::find_by_id(plan_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

        let sub_id = upsert_pending_subscription(&txn, member.user_id, &chosen_plan).await?;

        let new_payment = payment::ActiveModel {
            sub_id: Set(sub_id),
            amount: Set(chosen_plan.price),
            method: Set(PaymentMethod::Vnpay),
            payment_status: Set(PaymentStatus::Pending),
            invoice_no: Set(generate_invoice_no()),
            cashier_id: Set(Some(user_id)),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "VNPay renewal request: user {} plan {} payment {}",
            user_id,
            chosen_plan.plan_id,
            new_payment.payment_id
        );

        Ok(VnpayCreateResponse {
            payment_id: new_payment.payment_id,
            amount: chosen_plan.price,
            plan_name: chosen_plan.name,
            subscription_id: sub_id,
        })
    }
}

/// 找到可挂起的订阅行并返回其 id。
/// 生效中的订阅顺延有效期并退回 Pending；已有待支付订阅时复用该行，
/// 同一会员任一时刻最多一条 Pending；都没有则新建。
async fn upsert_pending_subscription(
    txn: &DatabaseTransaction,
    member_id: i64,
    chosen_plan: &plan::Model,
) -> AppResult<i64> {
    let months = Months::new(chosen_plan.duration_months.max(0) as u32);

    if let Some(active) = sub::Entity::find()
        .filter(sub::Column::MemberId.eq(member_id))
        .filter(sub::Column::Status.eq(SubscriptionStatus::Active))
        .order_by_desc(sub::Column::EndDate)
        .one(txn)
        .await?
    {
        let sub_id = active.sub_id;
        let extended = active
            .end_date
            .checked_add_months(months)
            .ok_or_else(|| AppError::InternalError("Invalid subscription period".to_string()))?;
        let mut am = active.into_active_model();
        am.end_date = Set(extended);
        am.status = Set(SubscriptionStatus::Pending);
        am.update(txn).await?;
        return Ok(sub_id);
    }

    let now = Utc::now();
    let end = now
        .checked_add_months(months)
        .ok_or_else(|| AppError::InternalError("Invalid subscription period".to_string()))?;

    if let Some(pending) = sub::Entity::find()
        .filter(sub::Column::MemberId.eq(member_id))
        .filter(sub::Column::Status.eq(SubscriptionStatus::Pending))
        .order_by_desc(sub::Column::EndDate)
        .one(txn)
        .await?
    {
        let sub_id = pending.sub_id;
        let mut am = pending.into_active_model();
        am.plan_id = Set(chosen_plan.plan_id);
        am.start_date = Set(now);
        am.end_date = Set(end);
        am.update(txn).await?;
        return Ok(sub_id);
    }

    let created = sub::ActiveModel {
        member_id: Set(member_id),
        plan_id: Set(chosen_plan.plan_id),
        start_date: Set(now),
        end_date: Set(end),
        status: Set(SubscriptionStatus::Pending),
        created_by: Set(member_id),
        created_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(created.sub_id)
}
