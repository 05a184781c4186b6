use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{RewardKind, reward_entity};

/// 最近中奖记录查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecentRewardsQuery {
    /// 返回条数 (默认 20，最大 100)
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RewardResponse {
    pub id: i64,
    pub draw_id: i64,
    pub ticket_id: i64,
    pub kind: RewardKind,
    pub amount: i64,
    pub paid_out: bool,
    pub settlement_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<reward_entity::Model> for RewardResponse {
    fn from(m: reward_entity::Model) -> Self {
        RewardResponse {
            id: m.id,
            draw_id: m.draw_id,
            ticket_id: m.ticket_id,
            kind: m.kind,
            amount: m.amount,
            paid_out: m.paid_out,
            settlement_ref: m.settlement_ref,
            created_at: m.created_at,
        }
    }
}

/// 下游结算完成后回写
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkRewardPaidRequest {
    /// 结算凭证 (如链上交易签名)
    pub settlement_ref: String,
}
