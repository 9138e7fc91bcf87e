use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, IntoActiveModel,
    QuerySelect, Set, TransactionTrait,
};

use crate::entities::payments::PaymentStatus;
use crate::entities::points_transactions::PointsTransactionType;
use crate::entities::subscriptions::SubscriptionStatus;
use crate::entities::users::UserRole;
use crate::entities::{
    payment_entity as payment, plan_entity as plan, points_transaction_entity as pt,
    subscription_entity as sub, user_entity as user,
};
use crate::error::{AppError, AppResult};
use crate::external::{PaymentUrlRequest, VnpayService};
use crate::models::*;

/// 网关回调/IPN 处理后的落库结果
enum GatewayDisposition {
    /// "00" 响应码，本次完成入账
    Applied,
    /// 非 "00"，支付单标记失败
    MarkedFailed,
    /// 支付单已是终态，本次未做任何改动
    AlreadyFinal,
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    vnpay_service: VnpayService,
}

impl PaymentService {
    pub fn new(pool: DatabaseConnection, vnpay_service: VnpayService) -> Self {
        Self {
            pool,
            vnpay_service,
        }
    }

    /// 前台人工确认柜台支付。角色校验、状态流转、积分入账同一事务。
    pub async fn confirm_payment_by_staff(
        &self,
        payment_id: i64,
        staff_user_id: i64,
    ) -> AppResult<ConfirmPaymentResponse> {
        let txn = self.pool.begin().await?;

        let staff = user::Entity::find_by_id(staff_user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("Only receptionist can confirm payments".to_string())
            })?;
        if staff.role != UserRole::Receptionist {
            return Err(AppError::Forbidden(
                "Only receptionist can confirm payments".to_string(),
            ));
        }

        let target = payment::Entity::find_by_id(payment_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        if target.payment_status != PaymentStatus::Pending {
            return Err(AppError::PaymentAlreadyFinalized(
                target.payment_status.to_string(),
            ));
        }

        let subscription = sub::Entity::find_by_id(target.sub_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;
        let sub_plan = plan::Entity::find_by_id(subscription.plan_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

        let sub_id = subscription.sub_id;
        let member_id = subscription.member_id;
        let sub_was_pending = subscription.status == SubscriptionStatus::Pending;

        let mut pay_am = target.into_active_model();
        pay_am.payment_status = Set(PaymentStatus::Success);
        pay_am.cashier_id = Set(Some(staff_user_id));
        pay_am.payment_date = Set(Some(Utc::now()));
        pay_am.update(&txn).await?;

        if sub_was_pending {
            let mut sub_am = subscription.into_active_model();
            sub_am.status = Set(SubscriptionStatus::Active);
            sub_am.update(&txn).await?;
        }

        let points_awarded = if sub_plan.points_earned > 0 {
            credit_points(
                &txn,
                member_id,
                sub_plan.points_earned,
                format!("Đăng ký gói: {}", sub_plan.name),
                sub_id,
                staff_user_id,
            )
            .await?;
            sub_plan.points_earned
        } else {
            0
        };

        txn.commit().await?;

        log::info!(
            "Payment {} confirmed by staff {}, {} points awarded",
            payment_id,
            staff_user_id,
            points_awarded
        );

        Ok(ConfirmPaymentResponse {
            payment_id,
            subscription_id: sub_id,
            points_awarded,
        })
    }

    /// 浏览器跳转回调。校验结果折算成前端结果页的重定向参数，不向外抛错。
    pub async fn handle_vnpay_callback(
        &self,
        params: &HashMap<String, String>,
    ) -> VnpayCallbackOutcome {
        let Some(txn_ref) = params.get("vnp_TxnRef") else {
            return VnpayCallbackOutcome::error("missing_transaction", None);
        };
        let parsed_id = txn_ref.parse::<i64>().ok();

        if !self.vnpay_service.verify_signature(params) {
            return VnpayCallbackOutcome::error("invalid_signature", parsed_id);
        }

        let Some(payment_id) = parsed_id else {
            return VnpayCallbackOutcome::error("payment_not_found", None);
        };

        let is_success = params.get("vnp_ResponseCode").map(String::as_str) == Some("00");
        let message = params.get("vnp_ResponseMessage").cloned();

        match self.process_gateway_params(payment_id, params, false).await {
            Ok(GatewayDisposition::Applied) => VnpayCallbackOutcome::success(payment_id, message),
            Ok(GatewayDisposition::MarkedFailed) => {
                VnpayCallbackOutcome::failed(payment_id, message)
            }
            // 终态重复回调照常跳转，落库不再变化
            Ok(GatewayDisposition::AlreadyFinal) => {
                if is_success {
                    VnpayCallbackOutcome::success(payment_id, message)
                } else {
                    VnpayCallbackOutcome::failed(payment_id, message)
                }
            }
            Err(AppError::NotFound(_)) => {
                VnpayCallbackOutcome::error("payment_not_found", Some(payment_id))
            }
            Err(AppError::AmountMismatch) => {
                VnpayCallbackOutcome::error("amount_mismatch", Some(payment_id))
            }
            Err(e) => {
                log::error!("VNPay callback error: {e}");
                VnpayCallbackOutcome::error("server_error", Some(payment_id))
            }
        }
    }

    /// 网关服务器间通知。永远应答网关的 RspCode/Message 形状。
    pub async fn handle_vnpay_ipn(&self, params: &HashMap<String, String>) -> IpnResponse {
        let Some(txn_ref) = params.get("vnp_TxnRef") else {
            return IpnResponse::new("01", "Missing transaction reference");
        };

        if !self.vnpay_service.verify_signature(params) {
            return IpnResponse::invalid_signature();
        }

        let Ok(payment_id) = txn_ref.parse::<i64>() else {
            return IpnResponse::order_not_found();
        };

        match self.process_gateway_params(payment_id, params, true).await {
            Ok(GatewayDisposition::Applied) | Ok(GatewayDisposition::MarkedFailed) => {
                IpnResponse::ok()
            }
            Ok(GatewayDisposition::AlreadyFinal) => IpnResponse::already_confirmed(),
            Err(AppError::NotFound(_)) => IpnResponse::order_not_found(),
            Err(AppError::AmountMismatch) => IpnResponse::amount_invalid(),
            Err(e) => {
                log::error!("VNPay IPN error: {e}");
                IpnResponse::internal_error()
            }
        }
    }

    /// 校验金额后签出支付跳转 URL
    pub async fn create_vnpay_url(
        &self,
        request: VnpayCreateUrlRequest,
        client_ip: &str,
    ) -> AppResult<VnpayCreateUrlResponse> {
        let stored = self.get_payment(request.payment_id).await?;
        if stored.amount != request.amount {
            return Err(AppError::AmountMismatch);
        }

        let payment_url = self.vnpay_service.build_payment_url(&PaymentUrlRequest {
            payment_id: request.payment_id,
            amount: request.amount,
            order_info: format!("Thanh toan goi {}", request.plan_name),
            ip_addr: client_ip.to_string(),
            bank_code: request.bank_code,
            locale: request.locale,
        });

        Ok(VnpayCreateUrlResponse { payment_url })
    }

    /// 支付结果页地址，回调处理完 302 跳转的目标
    pub fn result_url(&self) -> &str {
        self.vnpay_service.result_url()
    }

    pub async fn get_vnpay_status(&self, payment_id: i64) -> AppResult<VnpayStatusResponse> {
        let stored = self.get_payment(payment_id).await?;

        Ok(VnpayStatusResponse {
            payment_id: stored.payment_id,
            status: stored.payment_status,
            amount: stored.amount,
            method: stored.method,
            vnpay_transaction_id: stored.vnpay_transaction_id,
            vnpay_response_code: stored.vnpay_response_code,
        })
    }

    async fn get_payment(&self, payment_id: i64) -> AppResult<payment::Model> {
        payment::Entity::find_by_id(payment_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
    }

    /// 回调与 IPN 的公共落库路径。金额按 ×100 的最小单位回传，
    /// 容差 1（等价于 0.01）；终态支付单不再改动。
    async fn process_gateway_params(
        &self,
        payment_id: i64,
        params: &HashMap<String, String>,
        require_amount: bool,
    ) -> AppResult<GatewayDisposition> {
        let target = self.get_payment(payment_id).await?;

        match params.get("vnp_Amount").and_then(|v| v.parse::<i64>().ok()) {
            Some(gateway_amount) => {
                if (gateway_amount - target.amount * 100).abs() > 1 {
                    return Err(AppError::AmountMismatch);
                }
            }
            None if require_amount => return Err(AppError::AmountMismatch),
            None => {}
        }

        let response_code = params
            .get("vnp_ResponseCode")
            .map(String::as_str)
            .unwrap_or("");
        let is_success = response_code == "00";

        if target.payment_status != PaymentStatus::Pending {
            return Ok(GatewayDisposition::AlreadyFinal);
        }

        if is_success {
            self.apply_gateway_success(target, params).await?;
            Ok(GatewayDisposition::Applied)
        } else {
            self.mark_gateway_failed(target, response_code).await?;
            Ok(GatewayDisposition::MarkedFailed)
        }
    }

    /// 网关确认成功：支付单入账、订阅生效、积分上账，单事务
    async fn apply_gateway_success(
        &self,
        target: payment::Model,
        params: &HashMap<String, String>,
    ) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let payment_id = target.payment_id;
        let sub_id = target.sub_id;

        let mut pay_am = target.into_active_model();
        pay_am.payment_status = Set(PaymentStatus::Success);
        pay_am.vnpay_transaction_id = Set(params.get("vnp_TransactionNo").cloned());
        pay_am.vnpay_response_code = Set(params.get("vnp_ResponseCode").cloned());
        pay_am.vnpay_bank_code = Set(params.get("vnp_BankCode").cloned());
        pay_am.payment_date = Set(Some(Utc::now()));
        pay_am.update(&txn).await?;

        // 订阅行缺失时只落支付状态
        if let Some(subscription) = sub::Entity::find_by_id(sub_id).one(&txn).await? {
            let member_id = subscription.member_id;
            let plan_id = subscription.plan_id;

            let mut sub_am = subscription.into_active_model();
            sub_am.status = Set(SubscriptionStatus::Active);
            sub_am.update(&txn).await?;

            if let Some(sub_plan) = plan::Entity::find_by_id(plan_id).one(&txn).await?
                && sub_plan.points_earned > 0
            {
                credit_points(
                    &txn,
                    member_id,
                    sub_plan.points_earned,
                    "Đăng ký gói qua VNPay".to_string(),
                    sub_id,
                    member_id,
                )
                .await?;
            }
        }

        txn.commit().await?;
        log::info!("Payment {} settled by gateway", payment_id);
        Ok(())
    }

    async fn mark_gateway_failed(
        &self,
        target: payment::Model,
        response_code: &str,
    ) -> AppResult<()> {
        let payment_id = target.payment_id;
        let mut pay_am = target.into_active_model();
        pay_am.payment_status = Set(PaymentStatus::Failed);
        pay_am.vnpay_response_code = Set(Some(response_code.to_string()));
        pay_am.update(&self.pool).await?;

        log::info!(
            "Payment {} marked failed by gateway (code {})",
            payment_id,
            response_code
        );
        Ok(())
    }
}

/// 积分上账：锁会员行改余额，同时追加流水
async fn credit_points(
    txn: &DatabaseTransaction,
    member_id: i64,
    points: i64,
    description: String,
    sub_id: i64,
    created_by: i64,
) -> AppResult<()> {
    let member = user::Entity::find_by_id(member_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let new_balance = member.points + points;
    let mut member_am = member.into_active_model();
    member_am.points = Set(new_balance);
    member_am.update(txn).await?;

    pt::ActiveModel {
        user_id: Set(member_id),
        transaction_type: Set(PointsTransactionType::Earned),
        points: Set(points),
        description: Set(description),
        related_subscription_id: Set(Some(sub_id)),
        created_by: Set(created_by),
        created_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::config::VnpayConfig;
    use crate::entities::payments::PaymentMethod;
    use crate::entities::users::UserStatus;
    use crate::external::vnpay::sorted_query_string;

    fn vnpay_service() -> VnpayService {
        VnpayService::new(VnpayConfig {
            tmn_code: "TESTCODE".to_string(),
            hash_secret: "test-secret".to_string(),
            pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
            return_url: "https://club.example.com/payment/vnpay/callback".to_string(),
            result_url: "/payment-callback.html".to_string(),
        })
    }

    fn signed_params(service: &VnpayService, pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let sorted: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let hash = service.sign(&sorted_query_string(&sorted));
        let mut params: HashMap<String, String> = sorted.into_iter().collect();
        params.insert("vnp_SecureHash".to_string(), hash);
        params
    }

    fn test_user(user_id: i64, role: UserRole) -> user::Model {
        user::Model {
            user_id,
            username: "staff1".to_string(),
            full_name: "Nhân viên A".to_string(),
            email: None,
            phone: None,
            address: None,
            role,
            status: UserStatus::Active,
            password_hash: None,
            points: 0,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    fn test_payment(payment_id: i64, amount: i64, status: PaymentStatus) -> payment::Model {
        payment::Model {
            payment_id,
            sub_id: 1,
            amount,
            method: PaymentMethod::Vnpay,
            payment_status: status,
            invoice_no: format!("INV-{payment_id}"),
            cashier_id: None,
            payment_date: None,
            vnpay_transaction_id: None,
            vnpay_response_code: None,
            vnpay_bank_code: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_confirm_rejects_non_receptionist() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_user(9, UserRole::Member)]])
            .into_connection();
        let service = PaymentService::new(db, vnpay_service());

        let err = service.confirm_payment_by_staff(1, 9).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_duplicate_ipn_reports_already_confirmed() {
        let gateway = vnpay_service();
        let params = signed_params(
            &gateway,
            &[
                ("vnp_TxnRef", "7"),
                ("vnp_Amount", "10000000"),
                ("vnp_ResponseCode", "00"),
            ],
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_payment(7, 100000, PaymentStatus::Success)]])
            .into_connection();
        let service = PaymentService::new(db, gateway);

        let response = service.handle_vnpay_ipn(&params).await;
        assert_eq!(response, IpnResponse::already_confirmed());
    }

    #[tokio::test]
    async fn test_ipn_amount_mismatch_leaves_payment_pending() {
        let gateway = vnpay_service();
        let params = signed_params(
            &gateway,
            &[
                ("vnp_TxnRef", "7"),
                ("vnp_Amount", "999"),
                ("vnp_ResponseCode", "00"),
            ],
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_payment(7, 100000, PaymentStatus::Pending)]])
            .into_connection();
        let service = PaymentService::new(db, gateway);

        let response = service.handle_vnpay_ipn(&params).await;
        assert_eq!(response, IpnResponse::amount_invalid());
    }

    #[tokio::test]
    async fn test_ipn_rejects_bad_signature_without_db_access() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = PaymentService::new(db, vnpay_service());

        let mut params = HashMap::new();
        params.insert("vnp_TxnRef".to_string(), "7".to_string());
        params.insert("vnp_Amount".to_string(), "10000000".to_string());
        params.insert("vnp_SecureHash".to_string(), "deadbeef".to_string());

        let response = service.handle_vnpay_ipn(&params).await;
        assert_eq!(response, IpnResponse::invalid_signature());
    }

    #[tokio::test]
    async fn test_ipn_missing_txn_ref() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = PaymentService::new(db, vnpay_service());

        let response = service.handle_vnpay_ipn(&HashMap::new()).await;
        assert_eq!(response.rsp_code, "01");
    }
}
