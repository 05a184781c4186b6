use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use daily_draw_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::{DayBucketer, JwtService, hash_password},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // `daily-draw-backend hash-password <password>` 生成 ADMIN_PASSWORD_HASH
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let Some(password) = args.get(2) else {
            eprintln!("usage: daily-draw-backend hash-password <password>");
            std::process::exit(2);
        };
        let hashed = hash_password(password).expect("Failed to hash password");
        println!("{hashed}");
        return Ok(());
    }

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    let bucketer = DayBucketer::from_config(&config.draw).expect("Invalid draw configuration");
    if config.admin.password_hash.is_empty() {
        log::warn!("ADMIN_PASSWORD_HASH is not set, admin login is disabled");
    }
    if config.cron.secret.is_empty() {
        log::warn!("CRON_SECRET is not set, orchestration trigger will reject every call");
    }
    if config.admin.frozen {
        log::warn!("ADMIN_FROZEN is set, all administrative actions are disabled");
    }

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建服务
    let draw_service = DrawService::new(pool.clone(), bucketer, &config.draw);
    let selection_service =
        SelectionService::new(pool.clone(), config.draw.stale_claim_after_secs);
    let bonus_drop_service = BonusDropService::new(
        pool.clone(),
        draw_service.clone(),
        selection_service.clone(),
    );
    let ops_service = OpsService::new(pool.clone(), config.ops.auto_allowed);
    let panic_service = PanicService::new(pool.clone(), draw_service.clone());
    let reward_service = RewardService::new(pool.clone());
    let auth_service = AuthService::new(jwt_service.clone(), config.admin.password_hash.clone());
    let orchestration_service = OrchestrationService::new(
        ops_service.clone(),
        draw_service.clone(),
        bonus_drop_service.clone(),
        selection_service.clone(),
        &config.draw,
    );
    let admin_service = AdminService::new(
        config.admin.frozen,
        ops_service.clone(),
        draw_service.clone(),
        panic_service,
        bonus_drop_service,
        selection_service,
        reward_service.clone(),
    );

    // 启动后台任务（默认关闭）
    tasks::spawn_all(orchestration_service.clone(), config.scheduler.interval_secs);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{} (draw timezone {}, cutover {:02}:{:02})",
        config.server.host,
        config.server.port,
        bucketer.timezone(),
        config.draw.cutover_hour,
        config.draw.cutover_minute
    );

    let cron_secret = config.cron.secret.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone(), cron_secret.clone()))
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(reward_service.clone()))
            .app_data(web::Data::new(ops_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .app_data(web::Data::new(orchestration_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::draw_config)
                    .configure(handlers::reward_config)
                    .configure(handlers::ops_config)
                    .configure(handlers::cron_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
