use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{BonusDropStatus, bonus_drop_entity};

/// 新建定时加奖；fire_at 与 delay_secs 二选一
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScheduleBonusDropRequest {
    pub label: String,
    /// 奖励金额 (最小货币单位)
    pub amount: i64,
    pub fire_at: Option<DateTime<Utc>>,
    /// 相对当前时间的延迟秒数
    pub delay_secs: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BonusDropResponse {
    pub id: i64,
    pub draw_id: i64,
    pub label: String,
    pub amount: i64,
    pub fire_at: DateTime<Utc>,
    pub status: BonusDropStatus,
    pub created_at: DateTime<Utc>,
}

impl From<bonus_drop_entity::Model> for BonusDropResponse {
    fn from(m: bonus_drop_entity::Model) -> Self {
        BonusDropResponse {
            id: m.id,
            draw_id: m.draw_id,
            label: m.label,
            amount: m.amount,
            fire_at: m.fire_at,
            status: m.status,
            created_at: m.created_at,
        }
    }
}
