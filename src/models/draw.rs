use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{DrawStatus, TicketStatus, draw_entity, ticket_entity};

/// 今日开奖概要（展示层使用）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawSummaryResponse {
    pub id: i64,
    /// 所属自然日 (UTC 零点)
    pub day_bucket: DateTime<Utc>,
    pub status: DrawStatus,
    pub close_at: DateTime<Utc>,
    /// 当前参与票数
    pub ticket_count: u64,
    /// 当前奖池
    pub pool_amount: i64,
    pub resolved_at: Option<DateTime<Utc>>,
    /// 主奖中奖票号（未开奖为空）
    pub winning_ticket_code: Option<String>,
}

impl DrawSummaryResponse {
    pub fn from_parts(
        draw: draw_entity::Model,
        ticket_count: u64,
        winning_ticket_code: Option<String>,
    ) -> Self {
        Self {
            id: draw.id,
            day_bucket: draw.day_bucket,
            status: draw.status,
            close_at: draw.close_at,
            ticket_count,
            pool_amount: draw.pool_amount,
            resolved_at: draw.resolved_at,
            winning_ticket_code,
        }
    }
}

/// 参与今日开奖
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnterDrawRequest {
    /// 钱包地址 (base58)
    pub wallet: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketResponse {
    pub id: i64,
    pub draw_id: i64,
    pub code: String,
    pub wallet: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ticket_entity::Model> for TicketResponse {
    fn from(m: ticket_entity::Model) -> Self {
        TicketResponse {
            id: m.id,
            draw_id: m.draw_id,
            code: m.code,
            wallet: m.wallet,
            status: m.status,
            created_at: m.created_at,
        }
    }
}
