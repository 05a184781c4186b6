use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::OpsMode;

/// 一轮 bonus drop 处理统计
#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct BonusCycleSummary {
    /// 到期待处理
    pub found: u64,
    pub fired: u64,
    /// 无可用票，已取消
    pub cancelled_no_tickets: u64,
    /// 已被其他调用认领
    pub skipped_already_handled: u64,
    /// 持久化失败（下一轮重试）
    pub failed: u64,
}

/// 一轮自动开奖统计
#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct DrawCycleSummary {
    pub eligible: u64,
    pub resolved: u64,
    /// 无票直接关闭
    pub closed: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// 编排入口返回的汇总
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CycleSummary {
    pub run_id: Uuid,
    pub mode: OpsMode,
    pub bonus: BonusCycleSummary,
    pub draws: DrawCycleSummary,
    /// 本轮是否执行了自动开奖
    pub auto_ran: bool,
}
