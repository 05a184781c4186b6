use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::DrawStatus;
use crate::models::RewardResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// 紧急操作结果
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PanicActionResponse {
    pub draw_id: i64,
    /// 受影响记录数
    pub affected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_status: Option<DrawStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_at: Option<DateTime<Utc>>,
    /// 回滚时被删除的 bonus drop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_bonus_drop_id: Option<i64>,
}

/// 手动开奖结果
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ManualResolveResponse {
    Won {
        draw_id: i64,
        ticket_code: String,
        reward: RewardResponse,
    },
    NoEligibleTickets {
        draw_id: i64,
    },
    AlreadyHandled {
        draw_id: i64,
    },
}
