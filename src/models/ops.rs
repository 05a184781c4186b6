use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::OpsMode;

/// 当前自动化模式
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct OpsModeResponse {
    /// 实际生效模式
    pub effective: OpsMode,
    /// 数据库中的期望模式
    pub persisted: OpsMode,
    /// 部署级开关 (AUTO_DRAW_ENABLED)
    pub auto_allowed: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetOpsModeRequest {
    pub mode: OpsMode,
}
