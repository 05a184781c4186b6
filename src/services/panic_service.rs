use crate::entities::{BonusDropStatus, DrawStatus, bonus_drop_entity as drops, draw_entity as draws};
use crate::error::{AppError, AppResult};
use crate::models::PanicActionResponse;
use crate::services::DrawService;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};

/// 紧急控制
///
/// 三个操作都只针对“今天”的 draw，且都不会自动创建 draw：
/// 今天还没有 draw 时返回 NoDrawToday。
#[derive(Clone)]
pub struct PanicService {
    pool: DatabaseConnection,
    draw_service: DrawService,
}

impl PanicService {
    pub fn new(pool: DatabaseConnection, draw_service: DrawService) -> Self {
        Self { pool, draw_service }
    }

    async fn today(&self, now: DateTime<Utc>) -> AppResult<draws::Model> {
        self.draw_service
            .find_today(now)
            .await?
            .ok_or(AppError::NoDrawToday)
    }

    /// 立即关闭今天的 draw（截止时间改为 now），停止接受参与
    ///
    /// 已开奖或已被强制关闭的 draw 原样返回。
    pub async fn force_close_today(&self, now: DateTime<Utc>) -> AppResult<PanicActionResponse> {
        let draw = self.today(now).await?;

        let res = draws::Entity::update_many()
            .col_expr(draws::Column::Status, Expr::value(DrawStatus::Closed))
            .col_expr(draws::Column::CloseAt, Expr::value(now))
            .col_expr(draws::Column::CloseOverridden, Expr::value(true))
            .col_expr(draws::Column::UpdatedAt, Expr::value(now))
            .filter(draws::Column::Id.eq(draw.id))
            .filter(draws::Column::Status.eq(DrawStatus::Open))
            .filter(draws::Column::ResolvedAt.is_null())
            .exec(&self.pool)
            .await?;

        let current = draws::Entity::find_by_id(draw.id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::NoDrawToday)?;

        if res.rows_affected > 0 {
            log::warn!("Draw {} force-closed at {now}", draw.id);
        }
        Ok(PanicActionResponse {
            draw_id: current.id,
            affected: res.rows_affected,
            draw_status: Some(current.status),
            close_at: Some(current.close_at),
            removed_bonus_drop_id: None,
        })
    }

    /// 今天所有 SCHEDULED 的加奖一次性改为 CANCELLED
    pub async fn cancel_pending_bonuses(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<PanicActionResponse> {
        let draw = self.today(now).await?;

        let res = drops::Entity::update_many()
            .col_expr(drops::Column::Status, Expr::value(BonusDropStatus::Cancelled))
            .filter(drops::Column::DrawId.eq(draw.id))
            .filter(drops::Column::Status.eq(BonusDropStatus::Scheduled))
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NothingToCancel);
        }

        log::warn!(
            "Cancelled {} pending bonus drops for draw {}",
            res.rows_affected,
            draw.id
        );
        Ok(PanicActionResponse {
            draw_id: draw.id,
            affected: res.rows_affected,
            draw_status: None,
            close_at: None,
            removed_bonus_drop_id: None,
        })
    }

    /// 删除今天最近创建的一条加奖（无论状态），每次只删一条
    pub async fn rollback_last_bonus(&self, now: DateTime<Utc>) -> AppResult<PanicActionResponse> {
        let draw = self.today(now).await?;

        let latest = drops::Entity::find()
            .filter(drops::Column::DrawId.eq(draw.id))
            .order_by_desc(drops::Column::CreatedAt)
            .order_by_desc(drops::Column::Id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::NothingToRollback)?;

        let drop_id = latest.id;
        let status = latest.status;
        let res = latest.delete(&self.pool).await?;
        if res.rows_affected == 0 {
            // 并发回滚已删掉这一条
            return Err(AppError::NothingToRollback);
        }

        log::warn!("Rolled back bonus drop {drop_id} ({status}) for draw {}", draw.id);
        Ok(PanicActionResponse {
            draw_id: draw.id,
            affected: res.rows_affected,
            draw_status: None,
            close_at: None,
            removed_bonus_drop_id: Some(drop_id),
        })
    }
}
