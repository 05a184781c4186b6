use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, AppResult};

fn wallet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // base58 (不含 0 O I l)，32-44 位
    RE.get_or_init(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("valid wallet regex"))
}

/// 校验钱包地址格式
pub fn validate_wallet(wallet: &str) -> AppResult<()> {
    if !wallet_regex().is_match(wallet) {
        return Err(AppError::ValidationError(
            "Invalid wallet address (expected base58, 32-44 chars)".to_string(),
        ));
    }
    Ok(())
}

/// 去掉首尾空白
pub fn normalize_wallet(wallet: &str) -> String {
    wallet.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_wallet() {
        assert!(validate_wallet("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin").is_ok());
        assert!(validate_wallet("11111111111111111111111111111111").is_ok());
        // 含非法字符 0 / O / I / l
        assert!(validate_wallet("0xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin").is_err());
        assert!(validate_wallet("short").is_err());
        assert!(validate_wallet("").is_err());
    }

    #[test]
    fn test_normalize_wallet() {
        assert_eq!(
            normalize_wallet("  9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin \n"),
            "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
        );
    }
}
