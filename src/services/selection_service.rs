use crate::entities::{
    BonusDropStatus, DrawStatus, RewardKind, TicketStatus, bonus_drop_entity as drops,
    draw_entity as draws, reward_entity as rewards, ticket_entity as tickets,
};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// 一次认领并抽选的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// 产生了一条新的中奖记录
    Won {
        reward: rewards::Model,
        ticket: tickets::Model,
    },
    /// 候选池为空：bonus 已取消 / draw 已关闭
    NoEligibleTickets,
    /// 认领失败，已被其他调用处理
    AlreadyHandled,
}

/// 从候选池中等概率选出一张票
pub fn pick_uniform(pool: &[tickets::Model]) -> Option<&tickets::Model> {
    pool.choose(&mut rand::thread_rng())
}

/// 抽选服务
///
/// 互斥完全依赖条件更新（认领）：`UPDATE ... WHERE <未处理> AND <未认领或认领已过期>`，
/// affected rows 为 0 即表示已被其他调用处理。进程内不持有任何锁。
#[derive(Clone)]
pub struct SelectionService {
    pool: DatabaseConnection,
    stale_after: Duration,
}

impl SelectionService {
    pub fn new(pool: DatabaseConnection, stale_claim_after_secs: i64) -> Self {
        Self {
            pool,
            stale_after: Duration::seconds(stale_claim_after_secs),
        }
    }

    /// 主奖开奖
    ///
    /// 1. 认领 draw（resolved_at 为空）
    /// 2. 候选池: 该期 IN_DRAW 的票
    /// 3. 池为空则直接关闭该期，避免反复自动开奖
    /// 4. 等概率抽取
    /// 5. 单事务: draw -> COMPLETED，票 -> WON，写 main 中奖记录
    pub async fn resolve_draw(
        &self,
        draw_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<SelectionOutcome> {
        if !self.claim_draw(draw_id, now).await? {
            log::debug!("Draw {draw_id} already claimed, skipping");
            return Ok(SelectionOutcome::AlreadyHandled);
        }

        let draw = draws::Entity::find_by_id(draw_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Draw {draw_id} not found")))?;

        let candidates = tickets::Entity::find()
            .filter(tickets::Column::DrawId.eq(draw_id))
            .filter(tickets::Column::Status.eq(TicketStatus::InDraw))
            .order_by_asc(tickets::Column::Id)
            .all(&self.pool)
            .await?;

        let Some(chosen) = pick_uniform(&candidates).cloned() else {
            draws::Entity::update_many()
                .col_expr(draws::Column::Status, Expr::value(DrawStatus::Closed))
                .col_expr(draws::Column::ResolvedAt, Expr::value(now))
                .col_expr(draws::Column::UpdatedAt, Expr::value(now))
                .filter(draws::Column::Id.eq(draw_id))
                .filter(draws::Column::ResolvedAt.is_null())
                .exec(&self.pool)
                .await?;
            log::info!("Draw {draw_id} closed without winner (no tickets)");
            return Ok(SelectionOutcome::NoEligibleTickets);
        };

        let txn = self.pool.begin().await?;

        let mut update = draws::Entity::update_many()
            .col_expr(draws::Column::Status, Expr::value(DrawStatus::Completed))
            .col_expr(draws::Column::ResolvedAt, Expr::value(now))
            .col_expr(draws::Column::WinningTicketId, Expr::value(chosen.id))
            .col_expr(draws::Column::UpdatedAt, Expr::value(now));
        // 截止前人工开奖：截止时间提前到现在，且不再被日切同步改回
        if now < draw.close_at {
            update = update
                .col_expr(draws::Column::CloseAt, Expr::value(now))
                .col_expr(draws::Column::CloseOverridden, Expr::value(true));
        }
        let res = update
            .filter(draws::Column::Id.eq(draw_id))
            .filter(draws::Column::ResolvedAt.is_null())
            .exec(&txn)
            .await?;
        if res.rows_affected != 1 {
            txn.rollback().await?;
            return Ok(SelectionOutcome::AlreadyHandled);
        }

        let Some(ticket) = self.mark_ticket_won(&txn, &chosen).await? else {
            txn.rollback().await?;
            self.release_draw_claim(draw_id).await?;
            return Err(AppError::InternalError(format!(
                "Ticket {} left the pool during draw {draw_id}",
                chosen.id
            )));
        };

        let reward = rewards::ActiveModel {
            draw_id: Set(draw_id),
            ticket_id: Set(ticket.id),
            bonus_drop_id: Set(None),
            kind: Set(RewardKind::Main),
            amount: Set(draw.pool_amount),
            paid_out: Set(false),
            settlement_ref: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Draw {draw_id} resolved: ticket {} ({}) won {} from a pool of {}",
            ticket.id,
            ticket.code,
            reward.amount,
            candidates.len()
        );
        Ok(SelectionOutcome::Won { reward, ticket })
    }

    /// 触发一次加奖
    ///
    /// 认领期间状态保持 SCHEDULED，只有最终事务才会写入 FIRED / CANCELLED，
    /// 因此状态只会单向流转。已中过本期 bonus 的票不再参与。
    pub async fn fire_bonus_drop(
        &self,
        drop_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<SelectionOutcome> {
        if !self.claim_bonus_drop(drop_id, now).await? {
            log::debug!("Bonus drop {drop_id} already claimed, skipping");
            return Ok(SelectionOutcome::AlreadyHandled);
        }

        let drop = drops::Entity::find_by_id(drop_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bonus drop {drop_id} not found")))?;

        let bonus_holders = Query::select()
            .column(rewards::Column::TicketId)
            .from(rewards::Entity)
            .and_where(rewards::Column::DrawId.eq(drop.draw_id))
            .and_where(rewards::Column::Kind.eq(RewardKind::Bonus))
            .to_owned();

        let candidates = tickets::Entity::find()
            .filter(tickets::Column::DrawId.eq(drop.draw_id))
            .filter(tickets::Column::Status.eq(TicketStatus::InDraw))
            .filter(tickets::Column::Id.not_in_subquery(bonus_holders))
            .order_by_asc(tickets::Column::Id)
            .all(&self.pool)
            .await?;

        let Some(chosen) = pick_uniform(&candidates).cloned() else {
            let res = drops::Entity::update_many()
                .col_expr(
                    drops::Column::Status,
                    Expr::value(BonusDropStatus::Cancelled),
                )
                .filter(drops::Column::Id.eq(drop_id))
                .filter(drops::Column::Status.eq(BonusDropStatus::Scheduled))
                .exec(&self.pool)
                .await?;
            if res.rows_affected == 0 {
                return Ok(SelectionOutcome::AlreadyHandled);
            }
            log::info!("Bonus drop {drop_id} cancelled: no eligible tickets");
            return Ok(SelectionOutcome::NoEligibleTickets);
        };

        let txn = self.pool.begin().await?;

        // 期间可能被紧急取消，必须仍为 SCHEDULED
        let res = drops::Entity::update_many()
            .col_expr(drops::Column::Status, Expr::value(BonusDropStatus::Fired))
            .filter(drops::Column::Id.eq(drop_id))
            .filter(drops::Column::Status.eq(BonusDropStatus::Scheduled))
            .exec(&txn)
            .await?;
        if res.rows_affected != 1 {
            txn.rollback().await?;
            return Ok(SelectionOutcome::AlreadyHandled);
        }

        let Some(ticket) = self.mark_ticket_won(&txn, &chosen).await? else {
            txn.rollback().await?;
            self.release_bonus_claim(drop_id).await?;
            return Err(AppError::InternalError(format!(
                "Ticket {} left the pool during bonus drop {drop_id}",
                chosen.id
            )));
        };

        let reward = rewards::ActiveModel {
            draw_id: Set(drop.draw_id),
            ticket_id: Set(ticket.id),
            bonus_drop_id: Set(Some(drop_id)),
            kind: Set(RewardKind::Bonus),
            amount: Set(drop.amount),
            paid_out: Set(false),
            settlement_ref: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Bonus drop {drop_id} ({}) fired: ticket {} won {}",
            drop.label,
            ticket.code,
            reward.amount
        );
        Ok(SelectionOutcome::Won { reward, ticket })
    }

    // -----------------------------
    // 认领
    // -----------------------------

    /// 未认领，或认领已过期（上次认领后未能产生结果）
    fn claimable<C: ColumnTrait + Copy>(&self, column: C, now: DateTime<Utc>) -> Condition {
        Condition::any()
            .add(column.is_null())
            .add(column.lt(now - self.stale_after))
    }

    async fn claim_draw(&self, draw_id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let res = draws::Entity::update_many()
            .col_expr(draws::Column::ClaimedAt, Expr::value(now))
            .filter(draws::Column::Id.eq(draw_id))
            .filter(draws::Column::ResolvedAt.is_null())
            .filter(self.claimable(draws::Column::ClaimedAt, now))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected == 1)
    }

    async fn claim_bonus_drop(&self, drop_id: i64, now: DateTime<Utc>) -> AppResult<bool> {
        let res = drops::Entity::update_many()
            .col_expr(drops::Column::ClaimedAt, Expr::value(now))
            .filter(drops::Column::Id.eq(drop_id))
            .filter(drops::Column::Status.eq(BonusDropStatus::Scheduled))
            .filter(self.claimable(drops::Column::ClaimedAt, now))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected == 1)
    }

    async fn release_draw_claim(&self, draw_id: i64) -> AppResult<()> {
        draws::Entity::update_many()
            .col_expr(draws::Column::ClaimedAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(draws::Column::Id.eq(draw_id))
            .filter(draws::Column::ResolvedAt.is_null())
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    async fn release_bonus_claim(&self, drop_id: i64) -> AppResult<()> {
        drops::Entity::update_many()
            .col_expr(drops::Column::ClaimedAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(drops::Column::Id.eq(drop_id))
            .filter(drops::Column::Status.eq(BonusDropStatus::Scheduled))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    /// IN_DRAW -> WON；票已不在池中返回 None
    async fn mark_ticket_won(
        &self,
        txn: &DatabaseTransaction,
        chosen: &tickets::Model,
    ) -> AppResult<Option<tickets::Model>> {
        let res = tickets::Entity::update_many()
            .col_expr(tickets::Column::Status, Expr::value(TicketStatus::Won))
            .filter(tickets::Column::Id.eq(chosen.id))
            .filter(tickets::Column::Status.eq(TicketStatus::InDraw))
            .exec(txn)
            .await?;
        if res.rows_affected != 1 {
            return Ok(None);
        }
        let mut ticket = chosen.clone();
        ticket.status = TicketStatus::Won;
        Ok(Some(ticket))
    }
}
