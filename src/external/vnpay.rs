use std::collections::{BTreeMap, HashMap};

use chrono::{FixedOffset, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::config::VnpayConfig;

type HmacSha512 = Hmac<Sha512>;

/// 构造支付跳转 URL 所需的订单信息
#[derive(Debug)]
pub struct PaymentUrlRequest {
    pub payment_id: i64,
    /// 单位 VND，签名前会乘 100
    pub amount: i64,
    pub order_info: String,
    pub ip_addr: String,
    pub bank_code: Option<String>,
    pub locale: Option<String>,
}

#[derive(Clone)]
pub struct VnpayService {
    config: VnpayConfig,
}

impl VnpayService {
    pub fn new(config: VnpayConfig) -> Self {
        Self { config }
    }

    pub fn result_url(&self) -> &str {
        &self.config.result_url
    }

    /// 网关要求 GMT+7 的本地时间戳
    fn create_date() -> String {
        match FixedOffset::east_opt(7 * 3600) {
            Some(tz) => Utc::now().with_timezone(&tz).format("%Y%m%d%H%M%S").to_string(),
            None => Utc::now().format("%Y%m%d%H%M%S").to_string(),
        }
    }

    pub fn build_payment_url(&self, request: &PaymentUrlRequest) -> String {
        let mut params = BTreeMap::new();
        params.insert("vnp_Version".to_string(), "2.1.0".to_string());
        params.insert("vnp_Command".to_string(), "pay".to_string());
        params.insert("vnp_TmnCode".to_string(), self.config.tmn_code.clone());
        params.insert(
            "vnp_Amount".to_string(),
            (request.amount * 100).to_string(),
        );
        params.insert("vnp_CurrCode".to_string(), "VND".to_string());
        params.insert("vnp_TxnRef".to_string(), request.payment_id.to_string());
        params.insert("vnp_OrderInfo".to_string(), request.order_info.clone());
        params.insert("vnp_OrderType".to_string(), "other".to_string());
        params.insert(
            "vnp_Locale".to_string(),
            request.locale.clone().unwrap_or_else(|| "vn".to_string()),
        );
        params.insert(
            "vnp_ReturnUrl".to_string(),
            self.config.return_url.clone(),
        );
        params.insert("vnp_IpAddr".to_string(), request.ip_addr.clone());
        params.insert("vnp_CreateDate".to_string(), Self::create_date());

        if let Some(bank_code) = &request.bank_code
            && !bank_code.is_empty()
        {
            params.insert("vnp_BankCode".to_string(), bank_code.clone());
        }

        let sign_data = sorted_query_string(&params);
        let secure_hash = self.sign(&sign_data);

        format!(
            "{}?{}&vnp_SecureHash={}",
            self.config.pay_url, sign_data, secure_hash
        )
    }

    /// 对规范化串做 HMAC-SHA512，十六进制小写输出
    pub fn sign(&self, data: &str) -> String {
        let mut mac = match HmacSha512::new_from_slice(self.config.hash_secret.as_bytes()) {
            Ok(mac) => mac,
            // HMAC 对任意长度密钥都有效，此分支不可达
            Err(_) => return String::new(),
        };
        mac.update(data.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// 校验回调/IPN 签名。vnp_SecureHash 与 vnp_SecureHashType
    /// 不参与签名计算，比较走常数时间。
    pub fn verify_signature(&self, params: &HashMap<String, String>) -> bool {
        let Some(received) = params.get("vnp_SecureHash") else {
            return false;
        };

        let Ok(expected) = hex::decode(received) else {
            return false;
        };

        let filtered: BTreeMap<String, String> = params
            .iter()
            .filter(|(key, _)| {
                key.as_str() != "vnp_SecureHash" && key.as_str() != "vnp_SecureHashType"
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let sign_data = sorted_query_string(&filtered);

        let mut mac = match HmacSha512::new_from_slice(self.config.hash_secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(sign_data.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

/// 按键名排序后拼接 key=value，值按网关的规范化编码
pub fn sorted_query_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// 网关的编码约定：URL 编码后把 %20 换成 +
fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b' ' => encoded.push('+'),
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            other => {
                encoded.push('%');
                encoded.push_str(&format!("{:02X}", other));
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> VnpayService {
        VnpayService::new(VnpayConfig {
            tmn_code: "TESTCODE".to_string(),
            hash_secret: "TESTSECRET".to_string(),
            pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
            return_url: "http://localhost:8080/payment-callback.html".to_string(),
            result_url: "/payment-callback.html".to_string(),
        })
    }

    #[test]
    fn test_encode_component_gateway_rules() {
        assert_eq!(encode_component("hello world"), "hello+world");
        assert_eq!(encode_component("a+b"), "a%2Bb");
        assert_eq!(encode_component("Thanh toan goi 6 thang"), "Thanh+toan+goi+6+thang");
        assert_eq!(encode_component("100%"), "100%25");
        assert_eq!(encode_component("abc-_.~"), "abc-_.~");
        assert_eq!(encode_component("a/b:c"), "a%2Fb%3Ac");
    }

    #[test]
    fn test_sorted_query_string_orders_keys() {
        let mut params = BTreeMap::new();
        params.insert("vnp_TxnRef".to_string(), "42".to_string());
        params.insert("vnp_Amount".to_string(), "100000".to_string());
        params.insert("vnp_Command".to_string(), "pay".to_string());

        assert_eq!(
            sorted_query_string(&params),
            "vnp_Amount=100000&vnp_Command=pay&vnp_TxnRef=42"
        );
    }

    #[test]
    fn test_sign_produces_sha512_hex() {
        let service = test_service();
        let signature = service.sign("vnp_Amount=100000&vnp_TxnRef=42");
        assert_eq!(signature.len(), 128);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        // 签名确定性
        assert_eq!(signature, service.sign("vnp_Amount=100000&vnp_TxnRef=42"));
    }

    #[test]
    fn test_verify_signature_round_trip() {
        let service = test_service();

        let mut sorted = BTreeMap::new();
        sorted.insert("vnp_Amount".to_string(), "120000000".to_string());
        sorted.insert("vnp_ResponseCode".to_string(), "00".to_string());
        sorted.insert("vnp_TxnRef".to_string(), "7".to_string());
        let signature = service.sign(&sorted_query_string(&sorted));

        let mut params: HashMap<String, String> = sorted.into_iter().collect();
        params.insert("vnp_SecureHash".to_string(), signature);
        params.insert("vnp_SecureHashType".to_string(), "SHA512".to_string());

        assert!(service.verify_signature(&params));

        // 篡改金额后校验失败
        params.insert("vnp_Amount".to_string(), "999".to_string());
        assert!(!service.verify_signature(&params));
    }

    #[test]
    fn test_verify_signature_rejects_missing_or_garbage_hash() {
        let service = test_service();
        let mut params = HashMap::new();
        params.insert("vnp_TxnRef".to_string(), "1".to_string());
        assert!(!service.verify_signature(&params));

        params.insert("vnp_SecureHash".to_string(), "not-hex".to_string());
        assert!(!service.verify_signature(&params));
    }

    #[test]
    fn test_build_payment_url_shape() {
        let service = test_service();
        let url = service.build_payment_url(&PaymentUrlRequest {
            payment_id: 42,
            amount: 1_200_000,
            order_info: "Thanh toan goi Goi 6 thang".to_string(),
            ip_addr: "127.0.0.1".to_string(),
            bank_code: None,
            locale: None,
        });

        assert!(url.starts_with("https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?"));
        assert!(url.contains("vnp_Amount=120000000"));
        assert!(url.contains("vnp_TxnRef=42"));
        assert!(url.contains("vnp_Command=pay"));
        assert!(url.contains("vnp_Version=2.1.0"));
        assert!(url.contains("vnp_Locale=vn"));
        assert!(url.contains("&vnp_SecureHash="));
        assert!(!url.contains("vnp_BankCode"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_build_payment_url_with_bank_code() {
        let service = test_service();
        let url = service.build_payment_url(&PaymentUrlRequest {
            payment_id: 1,
            amount: 500_000,
            order_info: "Thanh toan".to_string(),
            ip_addr: "10.0.0.1".to_string(),
            bank_code: Some("NCB".to_string()),
            locale: Some("en".to_string()),
        });

        assert!(url.contains("vnp_BankCode=NCB"));
        assert!(url.contains("vnp_Locale=en"));
    }

    fn decode_component(value: &str) -> String {
        let bytes = value.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'+' => {
                    out.push(b' ');
                    i += 1;
                }
                b'%' if i + 2 < bytes.len() => {
                    let byte = u8::from_str_radix(&value[i + 1..i + 3], 16).unwrap();
                    out.push(byte);
                    i += 3;
                }
                other => {
                    out.push(other);
                    i += 1;
                }
            }
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_signed_url_verifies_back() {
        // 生成的 URL 参数应能通过自身的签名校验
        let service = test_service();
        let url = service.build_payment_url(&PaymentUrlRequest {
            payment_id: 9,
            amount: 300_000,
            order_info: "Goi 1 thang".to_string(),
            ip_addr: "127.0.0.1".to_string(),
            bank_code: None,
            locale: None,
        });

        let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
        let params: HashMap<String, String> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), decode_component(v)))
            .collect();

        assert!(service.verify_signature(&params));
    }
}
