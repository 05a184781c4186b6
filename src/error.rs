use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    /// 紧急冻结中，所有管理操作直接拒绝
    #[error("Administrative actions are frozen")]
    Frozen,

    #[error("No draw exists for today")]
    NoDrawToday,

    #[error("No scheduled bonus drops to cancel")]
    NothingToCancel,

    #[error("No bonus drop to roll back")]
    NothingToRollback,

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 对外暴露的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Frozen => "FROZEN",
            AppError::NoDrawToday => "NO_DRAW_TODAY",
            AppError::NothingToCancel => "NOTHING_TO_CANCEL",
            AppError::NothingToRollback => "NOTHING_TO_ROLLBACK",
            AppError::ConfigError(_) => "CONFIG_ERROR",
            AppError::InternalError(_) | AppError::SerdeJsonError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }
            AppError::Frozen => {
                log::warn!("Rejected administrative action while frozen");
                (StatusCode::LOCKED, self.to_string())
            }
            AppError::NoDrawToday | AppError::NothingToCancel | AppError::NothingToRollback => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::ConfigError(msg) => {
                log::error!("Config error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service misconfigured".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        assert_eq!(AppError::Frozen.code(), "FROZEN");
        assert_eq!(AppError::NothingToRollback.code(), "NOTHING_TO_ROLLBACK");
        assert_eq!(
            AppError::Frozen.error_response().status(),
            actix_web::http::StatusCode::LOCKED
        );
        assert_eq!(
            AppError::NoDrawToday.error_response().status(),
            actix_web::http::StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ValidationError("bad".into())
                .error_response()
                .status(),
            actix_web::http::StatusCode::BAD_REQUEST
        );
    }
}
