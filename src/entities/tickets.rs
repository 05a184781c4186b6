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
pub enum TicketStatus {
    #[sea_orm(string_value = "in_draw")]
    InDraw,
    #[sea_orm(string_value = "won")]
    Won,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "not_picked")]
    NotPicked,
    #[sea_orm(string_value = "claimed")]
    Claimed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::InDraw => write!(f, "in_draw"),
            TicketStatus::Won => write!(f, "won"),
            TicketStatus::Expired => write!(f, "expired"),
            TicketStatus::NotPicked => write!(f, "not_picked"),
            TicketStatus::Claimed => write!(f, "claimed"),
        }
    }
}

/// 参与票实体；draw_id 创建后不可变
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub draw_id: i64,
    /// 展示用票号，同一期内唯一
    pub code: String,
    /// 持有人钱包地址
    pub wallet: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::draws::Entity",
        from = "Column::DrawId",
        to = "super::draws::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Draw,
}

impl Related<super::draws::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Draw.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
