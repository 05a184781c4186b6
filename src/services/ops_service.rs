use crate::entities::ops_config_entity::{self as ops, SINGLETON_ID};
use crate::entities::OpsMode;
use crate::error::AppResult;
use crate::models::OpsModeResponse;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

/// 实际生效的模式
///
/// 只有数据库期望 AUTO 且部署级开关允许时才是 AUTO。
/// 部署级开关无法被数据库中的状态覆盖。
pub fn effective_mode(persisted: OpsMode, auto_allowed: bool) -> OpsMode {
    match (persisted, auto_allowed) {
        (OpsMode::Auto, true) => OpsMode::Auto,
        _ => OpsMode::Manual,
    }
}

#[derive(Clone)]
pub struct OpsService {
    pool: DatabaseConnection,
    auto_allowed: bool,
}

impl OpsService {
    pub fn new(pool: DatabaseConnection, auto_allowed: bool) -> Self {
        Self { pool, auto_allowed }
    }

    /// 数据库中的期望模式；单行缺失时按 MANUAL 处理
    pub async fn persisted_mode(&self) -> AppResult<OpsMode> {
        let row = ops::Entity::find_by_id(SINGLETON_ID).one(&self.pool).await?;
        Ok(row.map(|r| r.mode).unwrap_or(OpsMode::Manual))
    }

    pub async fn effective_mode(&self) -> AppResult<OpsMode> {
        Ok(effective_mode(self.persisted_mode().await?, self.auto_allowed))
    }

    pub async fn status(&self) -> AppResult<OpsModeResponse> {
        let persisted = self.persisted_mode().await?;
        Ok(OpsModeResponse {
            effective: effective_mode(persisted, self.auto_allowed),
            persisted,
            auto_allowed: self.auto_allowed,
        })
    }

    /// 更新期望模式 (upsert 单行)
    pub async fn set_mode(&self, mode: OpsMode) -> AppResult<OpsModeResponse> {
        ops::Entity::insert(ops::ActiveModel {
            id: Set(SINGLETON_ID),
            mode: Set(mode),
            updated_at: Set(Some(Utc::now())),
        })
        .on_conflict(
            OnConflict::column(ops::Column::Id)
                .update_columns([ops::Column::Mode, ops::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(&self.pool)
        .await?;

        if mode == OpsMode::Auto && !self.auto_allowed {
            log::warn!("Ops mode set to auto but AUTO_DRAW_ENABLED is off; staying manual");
        } else {
            log::info!("Ops mode set to {mode}");
        }
        self.status().await
    }
}
