use chrono::Utc;
use rand::Rng;

/// 闸机通行码字符集，去掉易混淆的 I O 0 1
const PASSCODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// 生成6位数字验证码
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

/// 生成8位临时通行码
pub fn generate_passcode() -> String {
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| PASSCODE_CHARS[rng.gen_range(0..PASSCODE_CHARS.len())] as char)
        .collect()
}

/// 生成发票号，毫秒时间戳加随机后缀保证唯一
pub fn generate_invoice_no() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "INV-{}-{:04}",
        Utc::now().timestamp_millis(),
        rng.gen_range(0..10000)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_six_digit_code() {
        let code = generate_six_digit_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        // 确保代码在有效范围内
        let code_num: u32 = code.parse().unwrap();
        assert!(code_num >= 100000 && code_num <= 999999);
    }

    #[test]
    fn test_generate_passcode_charset() {
        for _ in 0..50 {
            let passcode = generate_passcode();
            assert_eq!(passcode.len(), 8);
            assert!(passcode.bytes().all(|b| PASSCODE_CHARS.contains(&b)));
            // 不含易混淆字符
            assert!(!passcode.contains('I'));
            assert!(!passcode.contains('O'));
            assert!(!passcode.contains('0'));
            assert!(!passcode.contains('1'));
        }
    }

    #[test]
    fn test_generate_invoice_no_format() {
        let invoice = generate_invoice_no();
        assert!(invoice.starts_with("INV-"));

        let parts: Vec<&str> = invoice.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }
}
