use crate::config::DrawConfig;
use crate::entities::OpsMode;
use crate::models::{BonusCycleSummary, CycleSummary, DrawCycleSummary};
use crate::services::{
    BonusDropService, DrawService, OpsService, SelectionOutcome, SelectionService,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 编排入口
///
/// 一轮: 解析生效模式 -> 触发到期加奖 -> (仅 AUTO) 对到期的 draw 开奖。
/// 可被外部定时器重复、并发调用；互斥全部由各步骤的认领保证。
/// 任何一步失败都只影响对应条目，最终总会返回汇总。
#[derive(Clone)]
pub struct OrchestrationService {
    ops_service: OpsService,
    draw_service: DrawService,
    bonus_drop_service: BonusDropService,
    selection_service: SelectionService,
    bonus_batch_limit: u64,
    draw_batch_limit: u64,
}

impl OrchestrationService {
    pub fn new(
        ops_service: OpsService,
        draw_service: DrawService,
        bonus_drop_service: BonusDropService,
        selection_service: SelectionService,
        config: &DrawConfig,
    ) -> Self {
        Self {
            ops_service,
            draw_service,
            bonus_drop_service,
            selection_service,
            bonus_batch_limit: config.bonus_batch_limit,
            draw_batch_limit: config.draw_batch_limit,
        }
    }

    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleSummary {
        let run_id = Uuid::new_v4();

        let mode = match self.ops_service.effective_mode().await {
            Ok(mode) => mode,
            Err(e) => {
                log::error!("[cycle {run_id}] failed to read ops mode, assuming manual: {e:?}");
                OpsMode::Manual
            }
        };

        // 保证今天的 draw 存在，后续加奖与参与都依赖它
        if let Err(e) = self.draw_service.ensure_active_draw(now).await {
            log::error!("[cycle {run_id}] failed to ensure active draw: {e:?}");
        }

        let bonus = match self
            .bonus_drop_service
            .fire_due(now, self.bonus_batch_limit)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                log::error!("[cycle {run_id}] failed to load due bonus drops: {e:?}");
                BonusCycleSummary {
                    failed: 1,
                    ..Default::default()
                }
            }
        };

        let auto_ran = mode == OpsMode::Auto;
        let draws = if auto_ran {
            self.resolve_due_draws(run_id, now).await
        } else {
            DrawCycleSummary::default()
        };

        let summary = CycleSummary {
            run_id,
            mode,
            bonus,
            draws,
            auto_ran,
        };
        log::info!(
            "[cycle {run_id}] mode={mode} bonus={:?} draws={:?}",
            summary.bonus,
            summary.draws
        );
        summary
    }

    async fn resolve_due_draws(&self, run_id: Uuid, now: DateTime<Utc>) -> DrawCycleSummary {
        let mut summary = DrawCycleSummary::default();

        let due = match self
            .draw_service
            .due_draws(now, self.draw_batch_limit)
            .await
        {
            Ok(list) => list,
            Err(e) => {
                log::error!("[cycle {run_id}] failed to load due draws: {e:?}");
                summary.failed += 1;
                return summary;
            }
        };
        summary.eligible = due.len() as u64;

        for draw in due {
            match self.selection_service.resolve_draw(draw.id, now).await {
                Ok(SelectionOutcome::Won { .. }) => {
                    summary.resolved += 1;
                    if let Err(e) = self.draw_service.settle_unpicked(draw.id).await {
                        log::error!(
                            "[cycle {run_id}] failed to settle tickets of draw {}: {e:?}",
                            draw.id
                        );
                    }
                }
                Ok(SelectionOutcome::NoEligibleTickets) => summary.closed += 1,
                Ok(SelectionOutcome::AlreadyHandled) => summary.skipped += 1,
                Err(e) => {
                    log::error!("[cycle {run_id}] failed to resolve draw {}: {e:?}", draw.id);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
