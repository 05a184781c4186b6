use crate::error::{AppError, AppResult};
use crate::models::AdminLoginResponse;
use crate::utils::{JwtService, verify_admin_password};

/// 管理员登录：单一管理员口令 (bcrypt 哈希来自配置) 换取访问令牌
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    admin_password_hash: String,
}

impl AuthService {
    pub fn new(jwt_service: JwtService, admin_password_hash: String) -> Self {
        Self {
            jwt_service,
            admin_password_hash,
        }
    }

    pub fn admin_login(&self, password: &str) -> AppResult<AdminLoginResponse> {
        if password.is_empty() {
            return Err(AppError::ValidationError("Password is required".into()));
        }
        if !verify_admin_password(password, &self.admin_password_hash)? {
            log::warn!("Rejected admin login attempt");
            return Err(AppError::AuthError("Invalid credentials".into()));
        }

        let access_token = self.jwt_service.generate_admin_token()?;
        log::info!("Admin logged in");
        Ok(AdminLoginResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(hash: &str) -> AuthService {
        AuthService::new(JwtService::new("test-secret", 60), hash.to_string())
    }

    #[test]
    fn test_admin_login() {
        let hash = bcrypt::hash("hunter22", 4).unwrap();
        let svc = service(&hash);

        let ok = svc.admin_login("hunter22").unwrap();
        assert_eq!(ok.expires_in, 60);
        assert!(
            JwtService::new("test-secret", 60)
                .verify_admin_token(&ok.access_token)
                .is_ok()
        );

        assert!(matches!(
            svc.admin_login("wrong"),
            Err(AppError::AuthError(_))
        ));
        assert!(matches!(
            svc.admin_login(""),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_login_without_configured_hash_is_config_error() {
        assert!(matches!(
            service("").admin_login("anything"),
            Err(AppError::ConfigError(_))
        ));
    }
}
