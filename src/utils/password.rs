use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash, verify};

/// 对密码进行哈希（用于生成 ADMIN_PASSWORD_HASH）
pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::InternalError(format!("密码哈希失败: {e}")))
}

/// 校验管理员密码；未配置哈希视为配置错误
pub fn verify_admin_password(password: &str, password_hash: &str) -> AppResult<bool> {
    if password_hash.is_empty() {
        return Err(AppError::ConfigError(
            "ADMIN_PASSWORD_HASH is not configured".to_string(),
        ));
    }
    verify(password, password_hash)
        .map_err(|e| AppError::InternalError(format!("密码验证失败: {e}")))
}
