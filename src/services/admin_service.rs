use crate::entities::OpsMode;
use crate::error::{AppError, AppResult};
use crate::models::{
    BonusDropResponse, ManualResolveResponse, OpsModeResponse, PanicActionResponse,
    RewardResponse, ScheduleBonusDropRequest,
};
use crate::services::{
    BonusDropService, DrawService, OpsService, PanicService, RewardService, SelectionOutcome,
    SelectionService,
};
use chrono::{DateTime, Utc};

/// 管理操作
///
/// 每个操作进入前先检查紧急冻结开关，冻结时在读写任何数据之前直接失败。
#[derive(Clone)]
pub struct AdminService {
    frozen: bool,
    ops_service: OpsService,
    draw_service: DrawService,
    panic_service: PanicService,
    bonus_drop_service: BonusDropService,
    selection_service: SelectionService,
    reward_service: RewardService,
}

impl AdminService {
    pub fn new(
        frozen: bool,
        ops_service: OpsService,
        draw_service: DrawService,
        panic_service: PanicService,
        bonus_drop_service: BonusDropService,
        selection_service: SelectionService,
        reward_service: RewardService,
    ) -> Self {
        Self {
            frozen,
            ops_service,
            draw_service,
            panic_service,
            bonus_drop_service,
            selection_service,
            reward_service,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_not_frozen(&self) -> AppResult<()> {
        if self.frozen {
            return Err(AppError::Frozen);
        }
        Ok(())
    }

    pub async fn set_ops_mode(&self, mode: OpsMode) -> AppResult<OpsModeResponse> {
        self.ensure_not_frozen()?;
        self.ops_service.set_mode(mode).await
    }

    pub async fn force_close_today(&self, now: DateTime<Utc>) -> AppResult<PanicActionResponse> {
        self.ensure_not_frozen()?;
        self.panic_service.force_close_today(now).await
    }

    pub async fn cancel_pending_bonuses(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<PanicActionResponse> {
        self.ensure_not_frozen()?;
        self.panic_service.cancel_pending_bonuses(now).await
    }

    pub async fn rollback_last_bonus(&self, now: DateTime<Utc>) -> AppResult<PanicActionResponse> {
        self.ensure_not_frozen()?;
        self.panic_service.rollback_last_bonus(now).await
    }

    pub async fn schedule_bonus_drop(
        &self,
        now: DateTime<Utc>,
        req: &ScheduleBonusDropRequest,
    ) -> AppResult<BonusDropResponse> {
        self.ensure_not_frozen()?;
        self.bonus_drop_service.schedule(now, req).await
    }

    pub async fn list_bonus_drops(&self, now: DateTime<Utc>) -> AppResult<Vec<BonusDropResponse>> {
        self.ensure_not_frozen()?;
        self.bonus_drop_service.list_for_today(now).await
    }

    /// 手动开奖（不受 ops mode 限制）
    ///
    /// 优先处理最早一期已过截止但未开奖的 draw；日切之后“今天”已经是下一期，
    /// 刚截止的那一期只能从这里找到。没有到期的 draw 时才对今天的 draw 提前开奖。
    pub async fn resolve_today(&self, now: DateTime<Utc>) -> AppResult<ManualResolveResponse> {
        self.ensure_not_frozen()?;
        let overdue = self.draw_service.due_draws(now, 1).await?.into_iter().next();
        let draw = match overdue {
            Some(draw) => draw,
            None => self
                .draw_service
                .find_today(now)
                .await?
                .ok_or(AppError::NoDrawToday)?,
        };

        let response = match self.selection_service.resolve_draw(draw.id, now).await? {
            SelectionOutcome::Won { reward, ticket } => {
                self.draw_service.settle_unpicked(draw.id).await?;
                ManualResolveResponse::Won {
                    draw_id: draw.id,
                    ticket_code: ticket.code,
                    reward: reward.into(),
                }
            }
            SelectionOutcome::NoEligibleTickets => {
                ManualResolveResponse::NoEligibleTickets { draw_id: draw.id }
            }
            SelectionOutcome::AlreadyHandled => {
                ManualResolveResponse::AlreadyHandled { draw_id: draw.id }
            }
        };
        Ok(response)
    }

    pub async fn mark_reward_paid(
        &self,
        reward_id: i64,
        settlement_ref: &str,
    ) -> AppResult<RewardResponse> {
        self.ensure_not_frozen()?;
        self.reward_service.mark_paid(reward_id, settlement_ref).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DrawStatus, draw_entity as draws};
    use crate::test_support::*;
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_frozen_gate_rejects_every_action_before_touching_state() {
        let db = setup_db().await;
        let svc = admin_service(&db, true);
        let now = paris(2025, 6, 10, 12, 0, 0);
        let req = ScheduleBonusDropRequest {
            label: "Flash".into(),
            amount: 100,
            fire_at: None,
            delay_secs: Some(0),
        };

        assert!(matches!(
            svc.set_ops_mode(OpsMode::Auto).await,
            Err(AppError::Frozen)
        ));
        assert!(matches!(
            svc.force_close_today(now).await,
            Err(AppError::Frozen)
        ));
        assert!(matches!(
            svc.cancel_pending_bonuses(now).await,
            Err(AppError::Frozen)
        ));
        assert!(matches!(
            svc.rollback_last_bonus(now).await,
            Err(AppError::Frozen)
        ));
        assert!(matches!(
            svc.schedule_bonus_drop(now, &req).await,
            Err(AppError::Frozen)
        ));
        assert!(matches!(
            svc.list_bonus_drops(now).await,
            Err(AppError::Frozen)
        ));
        assert!(matches!(svc.resolve_today(now).await, Err(AppError::Frozen)));
        assert!(matches!(
            svc.mark_reward_paid(1, "ref").await,
            Err(AppError::Frozen)
        ));

        // 冻结时连 draw 都不会被创建
        assert_eq!(draws::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(
            OpsService::new(db.clone(), true)
                .persisted_mode()
                .await
                .unwrap(),
            OpsMode::Manual
        );
    }

    #[tokio::test]
    async fn test_resolve_today() {
        let db = setup_db().await;
        let svc = admin_service(&db, false);
        let now = paris(2025, 6, 10, 12, 0, 0);

        assert!(matches!(
            svc.resolve_today(now).await,
            Err(AppError::NoDrawToday)
        ));

        let draw = draw_service(&db).ensure_active_draw(now).await.unwrap();
        seed_tickets(&db, draw.id, 3, now).await;

        let first = svc.resolve_today(now).await.unwrap();
        assert!(matches!(first, ManualResolveResponse::Won { draw_id, .. } if draw_id == draw.id));
        assert!(matches!(
            svc.resolve_today(now).await.unwrap(),
            ManualResolveResponse::AlreadyHandled { .. }
        ));
    }

    #[tokio::test]
    async fn test_resolve_after_cutover_targets_closed_draw() {
        let db = setup_db().await;
        let svc = admin_service(&db, false);
        let noon = paris(2025, 6, 10, 12, 0, 0);
        let closed = draw_service(&db).ensure_active_draw(noon).await.unwrap();
        seed_tickets(&db, closed.id, 3, noon).await;

        // manual 模式的一轮编排在日切后创建了下一期
        let after_close = paris(2025, 6, 10, 22, 5, 0);
        let summary = orchestration_service(&db, true).run_cycle(after_close).await;
        assert!(!summary.auto_ran);
        let next = draw_service(&db).find_today(after_close).await.unwrap().unwrap();
        assert_ne!(next.id, closed.id);

        let outcome = svc.resolve_today(after_close).await.unwrap();
        assert!(
            matches!(outcome, ManualResolveResponse::Won { draw_id, .. } if draw_id == closed.id)
        );

        let closed = draws::Entity::find_by_id(closed.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.status, DrawStatus::Completed);
        assert_eq!(closed.close_at, paris(2025, 6, 10, 22, 0, 0));
        assert!(!closed.close_overridden);

        // 下一期不受影响，仍可参与
        let next = draws::Entity::find_by_id(next.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.status, DrawStatus::Open);
        assert!(next.resolved_at.is_none());
        let ticket = draw_service(&db)
            .enter_draw(paris(2025, 6, 11, 9, 0, 0), WALLET_A)
            .await
            .unwrap();
        assert_eq!(ticket.draw_id, next.id);

        // 没有到期的 draw 时才轮到今天这一期（提前开奖，池为空则关闭）
        assert!(matches!(
            svc.resolve_today(after_close).await.unwrap(),
            ManualResolveResponse::Won { draw_id, .. } if draw_id == next.id
        ));
    }
}
