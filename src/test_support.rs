//! 测试共用: 内存 SQLite + 真实迁移，以及常用的构造函数

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::config::DrawConfig;
use crate::entities::{
    BonusDropStatus, TicketStatus, bonus_drop_entity as drops, ticket_entity as tickets,
};
use crate::services::*;
use crate::utils::DayBucketer;

pub const WALLET_A: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

/// 内存库只能有一个连接，否则每个连接各自一份空库
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub fn test_draw_config() -> DrawConfig {
    DrawConfig {
        base_pool_amount: 1_000,
        entry_contribution: 100,
        stale_claim_after_secs: 60,
        ..DrawConfig::default()
    }
}

pub fn paris_bucketer() -> DayBucketer {
    DayBucketer::new(
        chrono_tz::Europe::Paris,
        NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    )
}

pub fn paris(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    chrono_tz::Europe::Paris
        .with_ymd_and_hms(y, m, d, h, min, s)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn draw_service(db: &DatabaseConnection) -> DrawService {
    DrawService::new(db.clone(), paris_bucketer(), &test_draw_config())
}

pub fn selection_service(db: &DatabaseConnection) -> SelectionService {
    SelectionService::new(db.clone(), test_draw_config().stale_claim_after_secs)
}

pub fn bonus_drop_service(db: &DatabaseConnection) -> BonusDropService {
    BonusDropService::new(db.clone(), draw_service(db), selection_service(db))
}

pub fn panic_service(db: &DatabaseConnection) -> PanicService {
    PanicService::new(db.clone(), draw_service(db))
}

pub fn orchestration_service(db: &DatabaseConnection, auto_allowed: bool) -> OrchestrationService {
    OrchestrationService::new(
        OpsService::new(db.clone(), auto_allowed),
        draw_service(db),
        bonus_drop_service(db),
        selection_service(db),
        &test_draw_config(),
    )
}

pub fn admin_service(db: &DatabaseConnection, frozen: bool) -> AdminService {
    AdminService::new(
        frozen,
        OpsService::new(db.clone(), true),
        draw_service(db),
        panic_service(db),
        bonus_drop_service(db),
        selection_service(db),
        RewardService::new(db.clone()),
    )
}

/// 直接插入 n 张 IN_DRAW 的票（不经过参与流程，不改变奖池）
pub async fn seed_tickets(
    db: &DatabaseConnection,
    draw_id: i64,
    n: usize,
    now: DateTime<Utc>,
) -> Vec<tickets::Model> {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let t = tickets::ActiveModel {
            draw_id: Set(draw_id),
            code: Set(format!("TEST-{i:04}")),
            wallet: Set(WALLET_A.to_string()),
            status: Set(TicketStatus::InDraw),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        out.push(t);
    }
    out
}

pub async fn seed_bonus_drop(
    db: &DatabaseConnection,
    draw_id: i64,
    fire_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> drops::Model {
    drops::ActiveModel {
        draw_id: Set(draw_id),
        label: Set("Test drop".to_string()),
        amount: Set(250),
        fire_at: Set(fire_at),
        status: Set(BonusDropStatus::Scheduled),
        claimed_at: Set(None),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
