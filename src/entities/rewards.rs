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
pub enum RewardKind {
    #[sea_orm(string_value = "main")]
    Main,
    #[sea_orm(string_value = "bonus")]
    Bonus,
}

impl std::fmt::Display for RewardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardKind::Main => write!(f, "main"),
            RewardKind::Bonus => write!(f, "bonus"),
        }
    }
}

/// 中奖记录实体
/// 说明:
/// - 每期最多一条 main；同一期同一张票最多一条 bonus (数据库部分唯一索引保证)
/// - bonus_drop_id 仅 bonus 记录有值；对应 drop 被回滚删除后置空
/// - paid_out / settlement_ref 由下游结算回写，本服务不负责转账
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rewards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub draw_id: i64,
    pub ticket_id: i64,
    pub bonus_drop_id: Option<i64>,
    pub kind: RewardKind,
    pub amount: i64,
    pub paid_out: bool,
    pub settlement_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tickets::Entity",
        from = "Column::TicketId",
        to = "super::tickets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Ticket,
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
