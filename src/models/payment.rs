use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::payments::{PaymentMethod, PaymentStatus};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmPaymentResponse {
    pub payment_id: i64,
    pub subscription_id: i64,
    pub points_awarded: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VnpayCreateUrlRequest {
    #[schema(example = 42)]
    pub payment_id: i64,
    #[schema(example = 1200000)]
    pub amount: i64,
    #[schema(example = "Gói 6 tháng")]
    pub plan_name: String,
    pub bank_code: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VnpayCreateUrlResponse {
    pub payment_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VnpayStatusResponse {
    pub payment_id: i64,
    pub status: PaymentStatus,
    pub amount: i64,
    pub method: PaymentMethod,
    pub vnpay_transaction_id: Option<String>,
    pub vnpay_response_code: Option<String>,
}

/// 网关回调处理结果，交给前端的重定向页面展示
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VnpayCallbackOutcome {
    pub status: String,
    pub payment_id: Option<i64>,
    pub message: Option<String>,
}

impl VnpayCallbackOutcome {
    pub fn success(payment_id: i64, message: Option<String>) -> Self {
        Self {
            status: "success".to_string(),
            payment_id: Some(payment_id),
            message,
        }
    }

    pub fn failed(payment_id: i64, message: Option<String>) -> Self {
        Self {
            status: "failed".to_string(),
            payment_id: Some(payment_id),
            message,
        }
    }

    pub fn error(code: &str, payment_id: Option<i64>) -> Self {
        Self {
            status: "error".to_string(),
            payment_id,
            message: Some(code.to_string()),
        }
    }

    /// 拼出重定向到结果页的 query string
    pub fn to_redirect_query(&self) -> String {
        let mut parts = vec![format!("status={}", self.status)];
        if let Some(id) = self.payment_id {
            parts.push(format!("paymentId={}", id));
        }
        if let Some(msg) = &self.message
            && !msg.is_empty()
        {
            let encoded: String = msg
                .bytes()
                .flat_map(|b| match b {
                    b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                        vec![b as char]
                    }
                    _ => format!("%{:02X}", b).chars().collect(),
                })
                .collect();
            parts.push(format!("message={}", encoded));
        }
        parts.join("&")
    }
}

/// 网关 IPN 应答，固定 RspCode/Message 形状
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IpnResponse {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            rsp_code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn ok() -> Self {
        Self::new("00", "Success")
    }

    pub fn order_not_found() -> Self {
        Self::new("01", "Order not found")
    }

    pub fn already_confirmed() -> Self {
        Self::new("02", "This order has been updated to the payment status")
    }

    pub fn amount_invalid() -> Self {
        Self::new("04", "Amount invalid")
    }

    pub fn invalid_signature() -> Self {
        Self::new("97", "Invalid signature")
    }

    pub fn internal_error() -> Self {
        Self::new("99", "Internal error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipn_response_serializes_gateway_shape() {
        let json = serde_json::to_value(IpnResponse::ok()).unwrap();
        assert_eq!(json["RspCode"], "00");
        assert_eq!(json["Message"], "Success");
    }

    #[test]
    fn test_redirect_query_encodes_message() {
        let outcome = VnpayCallbackOutcome::failed(7, Some("Giao dịch thất bại".to_string()));
        let query = outcome.to_redirect_query();
        assert!(query.starts_with("status=failed&paymentId=7&message="));
        assert!(!query.contains(' '));
    }

    #[test]
    fn test_redirect_query_without_message() {
        let outcome = VnpayCallbackOutcome::success(3, None);
        assert_eq!(outcome.to_redirect_query(), "status=success&paymentId=3");
    }
}
