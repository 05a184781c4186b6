use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl std::fmt::Display for DrawStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawStatus::Open => write!(f, "open"),
            DrawStatus::Closed => write!(f, "closed"),
            DrawStatus::Completed => write!(f, "completed"),
        }
    }
}

/// 每日开奖实体
/// 说明:
/// - day_bucket: 该期所属自然日 (UTC 零点)，唯一
/// - close_at: 截止时间，默认等于日切计算结果；close_overridden 为 true 时表示被人工提前关闭
/// - claimed_at: 开奖认领标记 (条件更新写入)，resolved_at 为空且认领过期时可重新认领
/// - resolved_at: 开奖结束时间 (无论是否产生中奖者)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "draws")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub day_bucket: DateTime<Utc>,
    pub status: DrawStatus,
    pub close_at: DateTime<Utc>,
    pub close_overridden: bool,
    /// 奖池金额 (最小货币单位)
    pub pool_amount: i64,
    pub claimed_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub winning_ticket_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// 是否仍接受参与
    pub fn accepts_entries(&self, now: DateTime<Utc>) -> bool {
        self.status == DrawStatus::Open && !self.is_resolved() && now < self.close_at
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tickets::Entity")]
    Tickets,
    #[sea_orm(has_many = "super::bonus_drops::Entity")]
    BonusDrops,
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::bonus_drops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BonusDrops.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
