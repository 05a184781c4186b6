use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// 路径所需的凭据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    /// 外部定时器共享密钥
    Cron,
    /// 管理员 JWT
    Admin,
}

// 路径配置
struct PathRules {
    exact_public: Vec<&'static str>,
    prefix_public: Vec<&'static str>,
    prefix_cron: Vec<&'static str>,
}

impl PathRules {
    fn new() -> Self {
        Self {
            exact_public: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_public: vec![
                "/swagger-ui/",
                "/api-docs/",
                "/api/v1/draws/",
                "/api/v1/rewards/",
                "/api/v1/ops/",
                "/api/v1/admin/auth/",
            ],
            prefix_cron: vec!["/api/v1/cron/"],
        }
    }

    fn classify(&self, path: &str) -> Access {
        if self.exact_public.contains(&path)
            || self.prefix_public.iter().any(|&p| path.starts_with(p))
        {
            return Access::Public;
        }
        if self.prefix_cron.iter().any(|&p| path.starts_with(p)) {
            return Access::Cron;
        }
        Access::Admin
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// 校验定时器密钥；未配置密钥时拒绝一切调用
fn check_cron_secret(token: Option<&str>, secret: &str) -> Result<(), AppError> {
    if secret.is_empty() {
        return Err(AppError::ConfigError("CRON_SECRET is not configured".into()));
    }
    match token {
        Some(t) if t == secret => Ok(()),
        Some(_) => Err(AppError::AuthError("Invalid cron secret".into())),
        None => Err(AppError::AuthError("Missing cron secret".into())),
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
    cron_secret: String,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService, cron_secret: String) -> Self {
        Self {
            jwt_service,
            cron_secret,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            cron_secret: self.cron_secret.clone(),
            rules: PathRules::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    cron_secret: String,
    rules: PathRules,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        match self.rules.classify(req.path()) {
            Access::Public => Box::pin(self.service.call(req)),
            Access::Cron => match check_cron_secret(bearer_token(&req), &self.cron_secret) {
                Ok(()) => Box::pin(self.service.call(req)),
                Err(error) => {
                    log::warn!("Rejected cron call to {}: {error}", req.path());
                    Box::pin(async move { Err(error.into()) })
                }
            },
            Access::Admin => {
                let Some(token) = bearer_token(&req) else {
                    let error = AppError::AuthError("Missing access token".to_string());
                    return Box::pin(async move { Err(error.into()) });
                };
                match self.jwt_service.verify_admin_token(token) {
                    Ok(claims) => {
                        req.extensions_mut().insert(claims.sub);
                        Box::pin(self.service.call(req))
                    }
                    Err(error) => Box::pin(async move { Err(error.into()) }),
                }
            }
        }
    }
}
