use actix_cors::Cors;

/// 只读接口供外部展示层调用，放开来源；管理接口依赖 Bearer 令牌而非 Cookie
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
