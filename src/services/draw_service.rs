use crate::config::DrawConfig;
use crate::entities::{DrawStatus, TicketStatus, draw_entity as draws, ticket_entity as tickets};
use crate::error::{AppError, AppResult};
use crate::models::DrawSummaryResponse;
use crate::utils::{DayBucketer, DrawWindow, generate_ticket_code, normalize_wallet, validate_wallet};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 生成票号时的最大重试次数
const TICKET_CODE_ATTEMPTS: usize = 5;

/// 开奖生命周期管理
///
/// 保证每个自然日 (day bucket) 恰好一期开奖，并让 close_at 与日切计算保持一致。
/// 这是唯一创建 draw 的入口，其它模块都假定“今天”的 draw 已存在。
#[derive(Clone)]
pub struct DrawService {
    pool: DatabaseConnection,
    bucketer: DayBucketer,
    base_pool_amount: i64,
    entry_contribution: i64,
}

impl DrawService {
    pub fn new(pool: DatabaseConnection, bucketer: DayBucketer, config: &DrawConfig) -> Self {
        Self {
            pool,
            bucketer,
            base_pool_amount: config.base_pool_amount,
            entry_contribution: config.entry_contribution,
        }
    }

    pub fn bucketer(&self) -> &DayBucketer {
        &self.bucketer
    }

    /// 获取 `now` 所属的一期开奖（不存在则创建）
    ///
    /// 单事务内:
    /// 1. 按 day_bucket 查找，不存在则以 OPEN 创建
    /// 2. 未开奖且未被人工覆盖时，close_at 与计算值不一致则同步
    /// 3. 同上条件下，状态不是 OPEN 则重新打开
    pub async fn ensure_active_draw(&self, now: DateTime<Utc>) -> AppResult<draws::Model> {
        let window = self.bucketer.window_for(now);
        let txn = self.pool.begin().await?;
        let draw = self.ensure_in(&txn, window, now).await?;
        txn.commit().await?;
        Ok(draw)
    }

    async fn ensure_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        window: DrawWindow,
        now: DateTime<Utc>,
    ) -> Result<draws::Model, DbErr> {
        let existing = draws::Entity::find()
            .filter(draws::Column::DayBucket.eq(window.day_bucket))
            .one(conn)
            .await?;

        let Some(draw) = existing else {
            // 并发创建时由唯一索引兜底，冲突则忽略后重新读取
            draws::Entity::insert(draws::ActiveModel {
                day_bucket: Set(window.day_bucket),
                status: Set(DrawStatus::Open),
                close_at: Set(window.close_at),
                close_overridden: Set(false),
                pool_amount: Set(self.base_pool_amount),
                created_at: Set(Some(now)),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .on_conflict(
                OnConflict::column(draws::Column::DayBucket)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

            let created = draws::Entity::find()
                .filter(draws::Column::DayBucket.eq(window.day_bucket))
                .one(conn)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound("draw missing after insert".into()))?;
            log::info!(
                "Created draw {} for bucket {} (close_at {})",
                created.id,
                created.day_bucket,
                created.close_at
            );
            return Ok(created);
        };

        // 已开奖或被人工关闭的 draw 保持原样
        if draw.is_resolved() || draw.close_overridden {
            return Ok(draw);
        }

        let resync = draw.close_at != window.close_at;
        let reopen = now < window.close_at && draw.status != DrawStatus::Open;
        if !resync && !reopen {
            return Ok(draw);
        }

        if resync {
            log::warn!(
                "Draw {} close_at drifted ({} -> {}), resyncing",
                draw.id,
                draw.close_at,
                window.close_at
            );
        }
        if reopen {
            log::info!("Reopening draw {} (was {})", draw.id, draw.status);
        }

        let mut am = draw.into_active_model();
        am.close_at = Set(window.close_at);
        am.status = Set(DrawStatus::Open);
        am.updated_at = Set(Some(now));
        am.update(conn).await
    }

    /// 查找今天的 draw，不创建
    pub async fn find_today(&self, now: DateTime<Utc>) -> AppResult<Option<draws::Model>> {
        let bucket = self.bucketer.day_bucket(now);
        let draw = draws::Entity::find()
            .filter(draws::Column::DayBucket.eq(bucket))
            .one(&self.pool)
            .await?;
        Ok(draw)
    }

    /// 今日开奖概要
    pub async fn today_summary(&self, now: DateTime<Utc>) -> AppResult<DrawSummaryResponse> {
        let draw = self.ensure_active_draw(now).await?;
        let ticket_count = tickets::Entity::find()
            .filter(tickets::Column::DrawId.eq(draw.id))
            .count(&self.pool)
            .await?;

        let winning_ticket_code = match draw.winning_ticket_id {
            Some(ticket_id) => tickets::Entity::find_by_id(ticket_id)
                .one(&self.pool)
                .await?
                .map(|t| t.code),
            None => None,
        };

        Ok(DrawSummaryResponse::from_parts(
            draw,
            ticket_count,
            winning_ticket_code,
        ))
    }

    /// 参与今日开奖
    ///
    /// draw 必须处于 OPEN 且未过截止时间；奖池增加与建票在同一事务内完成。
    pub async fn enter_draw(&self, now: DateTime<Utc>, wallet: &str) -> AppResult<tickets::Model> {
        let wallet = normalize_wallet(wallet);
        validate_wallet(&wallet)?;

        let draw = self.ensure_active_draw(now).await?;
        if !draw.accepts_entries(now) {
            return Err(AppError::ValidationError(
                "Draw is closed for entries".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        // 条件更新：仅在仍可参与时累加奖池，避免与强制关闭竞争
        let res = draws::Entity::update_many()
            .col_expr(
                draws::Column::PoolAmount,
                Expr::col(draws::Column::PoolAmount).add(self.entry_contribution),
            )
            .col_expr(draws::Column::UpdatedAt, Expr::value(now))
            .filter(draws::Column::Id.eq(draw.id))
            .filter(draws::Column::Status.eq(DrawStatus::Open))
            .filter(draws::Column::ResolvedAt.is_null())
            .filter(draws::Column::CloseAt.gt(now))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Draw is closed for entries".into(),
            ));
        }

        for _ in 0..TICKET_CODE_ATTEMPTS {
            let code = generate_ticket_code();
            let taken = tickets::Entity::find()
                .filter(tickets::Column::DrawId.eq(draw.id))
                .filter(tickets::Column::Code.eq(code.as_str()))
                .count(&txn)
                .await?
                > 0;
            if taken {
                continue;
            }

            let ticket = tickets::ActiveModel {
                draw_id: Set(draw.id),
                code: Set(code),
                wallet: Set(wallet.clone()),
                status: Set(TicketStatus::InDraw),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            txn.commit().await?;
            return Ok(ticket);
        }

        Err(AppError::InternalError(
            "Failed to generate a unique ticket code".into(),
        ))
    }

    /// 已过截止且未开奖的 draw（按 close_at 升序，最多 limit 条）
    pub async fn due_draws(&self, now: DateTime<Utc>, limit: u64) -> AppResult<Vec<draws::Model>> {
        let list = draws::Entity::find()
            .filter(draws::Column::CloseAt.lte(now))
            .filter(draws::Column::ResolvedAt.is_null())
            .order_by_asc(draws::Column::CloseAt)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    /// 主奖开出后，剩余 IN_DRAW 的票标记为 NOT_PICKED；返回更新条数
    pub async fn settle_unpicked(&self, draw_id: i64) -> AppResult<u64> {
        let res = tickets::Entity::update_many()
            .col_expr(tickets::Column::Status, Expr::value(TicketStatus::NotPicked))
            .filter(tickets::Column::DrawId.eq(draw_id))
            .filter(tickets::Column::Status.eq(TicketStatus::InDraw))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[tokio::test]
    async fn test_ensure_active_draw_creates_open_draw() {
        let db = setup_db().await;
        let svc = draw_service(&db);
        let now = paris(2025, 6, 10, 21, 59, 0);

        let draw = svc.ensure_active_draw(now).await.unwrap();
        assert_eq!(draw.status, DrawStatus::Open);
        assert_eq!(draw.day_bucket, utc(2025, 6, 10, 0, 0, 0));
        assert_eq!(draw.close_at, paris(2025, 6, 10, 22, 0, 0));
        assert_eq!(draw.pool_amount, test_draw_config().base_pool_amount);
    }

    #[tokio::test]
    async fn test_ensure_active_draw_is_idempotent() {
        let db = setup_db().await;
        let svc = draw_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);

        let first = svc.ensure_active_draw(now).await.unwrap();
        let second = svc.ensure_active_draw(now).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.status, second.status);
        assert_eq!(draws::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_after_cutover_creates_next_day_draw() {
        let db = setup_db().await;
        let svc = draw_service(&db);

        let today = svc
            .ensure_active_draw(paris(2025, 6, 10, 21, 0, 0))
            .await
            .unwrap();
        let tomorrow = svc
            .ensure_active_draw(paris(2025, 6, 10, 22, 0, 1))
            .await
            .unwrap();
        assert_ne!(today.id, tomorrow.id);
        assert_eq!(tomorrow.day_bucket, utc(2025, 6, 11, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_drifted_close_time_is_resynced_and_reopened() {
        let db = setup_db().await;
        let svc = draw_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = svc.ensure_active_draw(now).await.unwrap();

        // 模拟手工改坏 close_at 并关闭
        let mut am = draw.clone().into_active_model();
        am.close_at = Set(paris(2025, 6, 10, 18, 0, 0));
        am.status = Set(DrawStatus::Closed);
        am.update(&db).await.unwrap();

        let fixed = svc.ensure_active_draw(now).await.unwrap();
        assert_eq!(fixed.id, draw.id);
        assert_eq!(fixed.close_at, paris(2025, 6, 10, 22, 0, 0));
        assert_eq!(fixed.status, DrawStatus::Open);
    }

    #[tokio::test]
    async fn test_overridden_draw_is_left_alone() {
        let db = setup_db().await;
        let svc = draw_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = svc.ensure_active_draw(now).await.unwrap();

        let mut am = draw.clone().into_active_model();
        am.close_at = Set(now);
        am.status = Set(DrawStatus::Closed);
        am.close_overridden = Set(true);
        am.update(&db).await.unwrap();

        let later = svc
            .ensure_active_draw(paris(2025, 6, 10, 13, 0, 0))
            .await
            .unwrap();
        assert_eq!(later.status, DrawStatus::Closed);
        assert_eq!(later.close_at, now);
    }

    #[tokio::test]
    async fn test_enter_draw_adds_ticket_and_grows_pool() {
        let db = setup_db().await;
        let svc = draw_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);

        let ticket = svc.enter_draw(now, WALLET_A).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::InDraw);
        assert_eq!(ticket.wallet, WALLET_A);

        let summary = svc.today_summary(now).await.unwrap();
        assert_eq!(summary.ticket_count, 1);
        let cfg = test_draw_config();
        assert_eq!(
            summary.pool_amount,
            cfg.base_pool_amount + cfg.entry_contribution
        );
        assert!(summary.winning_ticket_code.is_none());
    }

    #[tokio::test]
    async fn test_enter_draw_rejects_bad_wallet_and_closed_draw() {
        let db = setup_db().await;
        let svc = draw_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);

        assert!(matches!(
            svc.enter_draw(now, "not-a-wallet").await,
            Err(AppError::ValidationError(_))
        ));

        let draw = svc.ensure_active_draw(now).await.unwrap();
        let mut am = draw.into_active_model();
        am.status = Set(DrawStatus::Closed);
        am.close_at = Set(now);
        am.close_overridden = Set(true);
        am.update(&db).await.unwrap();

        assert!(matches!(
            svc.enter_draw(now, WALLET_A).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_due_draws_and_settle_unpicked() {
        let db = setup_db().await;
        let svc = draw_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = svc.ensure_active_draw(now).await.unwrap();
        seed_tickets(&db, draw.id, 3, now).await;

        assert!(svc.due_draws(now, 10).await.unwrap().is_empty());
        let after_close = paris(2025, 6, 10, 22, 5, 0);
        let due = svc.due_draws(after_close, 10).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, draw.id);

        assert_eq!(svc.settle_unpicked(draw.id).await.unwrap(), 3);
        assert_eq!(svc.settle_unpicked(draw.id).await.unwrap(), 0);
    }
}
