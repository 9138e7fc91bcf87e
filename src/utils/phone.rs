use regex::Regex;

/// 手机号脱敏，0912345678 -> 0912***678
pub fn mask_phone(phone: &str) -> String {
    match Regex::new(r"^(\d{4})(\d{3})(\d{3})$") {
        Ok(re) if re.is_match(phone) => re.replace(phone, "$1***$3").to_string(),
        _ => phone.to_string(),
    }
}

/// 格式化手机号为国际格式，发短信前调用
pub fn format_phone_international(phone: &str) -> String {
    let trimmed: String = phone.chars().filter(|c| !c.is_whitespace()).collect();

    if trimmed.starts_with('+') {
        return trimmed;
    }

    // 本地格式 0xxxxxxxxx 去掉前导 0
    if trimmed.starts_with('0') && trimmed.len() == 10 {
        return format!("+84{}", &trimmed[1..]);
    }

    if trimmed.len() == 9 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return format!("+84{}", trimmed);
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("0912345678"), "0912***678");
        assert_eq!(mask_phone("0987654321"), "0987***321");
        // 非标准长度原样返回
        assert_eq!(mask_phone("12345"), "12345");
    }

    #[test]
    fn test_format_phone_international() {
        assert_eq!(format_phone_international("0912345678"), "+84912345678");
        assert_eq!(format_phone_international("912345678"), "+84912345678");
        assert_eq!(format_phone_international("+84912345678"), "+84912345678");
        assert_eq!(format_phone_international("0912 345 678"), "+84912345678");
    }
}
