use crate::entities::{BonusDropStatus, bonus_drop_entity as drops};
use crate::error::{AppError, AppResult};
use crate::models::{BonusCycleSummary, BonusDropResponse, ScheduleBonusDropRequest};
use crate::services::{DrawService, SelectionOutcome, SelectionService};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// 标签最大长度
const MAX_LABEL_LEN: usize = 64;

/// 定时加奖
#[derive(Clone)]
pub struct BonusDropService {
    pool: DatabaseConnection,
    draw_service: DrawService,
    selection_service: SelectionService,
}

impl BonusDropService {
    pub fn new(
        pool: DatabaseConnection,
        draw_service: DrawService,
        selection_service: SelectionService,
    ) -> Self {
        Self {
            pool,
            draw_service,
            selection_service,
        }
    }

    /// 在今天的开奖下新建一次加奖
    pub async fn schedule(
        &self,
        now: DateTime<Utc>,
        req: &ScheduleBonusDropRequest,
    ) -> AppResult<BonusDropResponse> {
        let label = req.label.trim();
        if label.is_empty() || label.chars().count() > MAX_LABEL_LEN {
            return Err(AppError::ValidationError(format!(
                "Label must be 1-{MAX_LABEL_LEN} characters"
            )));
        }
        if req.amount <= 0 {
            return Err(AppError::ValidationError("Amount must be positive".into()));
        }

        let fire_at = match (req.fire_at, req.delay_secs) {
            (Some(at), None) => at,
            (None, Some(delay)) if delay >= 0 => now + Duration::seconds(delay),
            (None, Some(_)) => {
                return Err(AppError::ValidationError(
                    "delay_secs must not be negative".into(),
                ));
            }
            _ => {
                return Err(AppError::ValidationError(
                    "Exactly one of fire_at / delay_secs is required".into(),
                ));
            }
        };

        let draw = self.draw_service.ensure_active_draw(now).await?;

        let created = drops::ActiveModel {
            draw_id: Set(draw.id),
            label: Set(label.to_string()),
            amount: Set(req.amount),
            fire_at: Set(fire_at),
            status: Set(BonusDropStatus::Scheduled),
            claimed_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Scheduled bonus drop {} ({}) for draw {} at {}",
            created.id,
            created.label,
            draw.id,
            created.fire_at
        );
        Ok(created.into())
    }

    /// 已到期的 SCHEDULED 加奖，按 fire_at 升序
    pub async fn due_drops(&self, now: DateTime<Utc>, limit: u64) -> AppResult<Vec<drops::Model>> {
        let list = drops::Entity::find()
            .filter(drops::Column::Status.eq(BonusDropStatus::Scheduled))
            .filter(drops::Column::FireAt.lte(now))
            .order_by_asc(drops::Column::FireAt)
            .order_by_asc(drops::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    /// 处理一批到期加奖
    ///
    /// 每条独立认领、独立提交；单条失败只记日志并计数，不影响后续条目。
    /// 超出 limit 的部分留给下一轮。
    pub async fn fire_due(&self, now: DateTime<Utc>, limit: u64) -> AppResult<BonusCycleSummary> {
        let due = self.due_drops(now, limit).await?;
        let mut summary = BonusCycleSummary {
            found: due.len() as u64,
            ..Default::default()
        };

        for drop in due {
            match self.selection_service.fire_bonus_drop(drop.id, now).await {
                Ok(SelectionOutcome::Won { .. }) => summary.fired += 1,
                Ok(SelectionOutcome::NoEligibleTickets) => summary.cancelled_no_tickets += 1,
                Ok(SelectionOutcome::AlreadyHandled) => summary.skipped_already_handled += 1,
                Err(e) => {
                    log::error!("Failed to fire bonus drop {}: {e:?}", drop.id);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// 今天这一期的全部加奖（按创建时间倒序）
    pub async fn list_for_today(&self, now: DateTime<Utc>) -> AppResult<Vec<BonusDropResponse>> {
        let Some(draw) = self.draw_service.find_today(now).await? else {
            return Ok(Vec::new());
        };
        let list = drops::Entity::find()
            .filter(drops::Column::DrawId.eq(draw.id))
            .order_by_desc(drops::Column::CreatedAt)
            .order_by_desc(drops::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use sea_orm::ConnectionTrait;

    fn request(label: &str, amount: i64, delay_secs: Option<i64>) -> ScheduleBonusDropRequest {
        ScheduleBonusDropRequest {
            label: label.into(),
            amount,
            fire_at: None,
            delay_secs,
        }
    }

    #[tokio::test]
    async fn test_schedule_validates_input() {
        let db = setup_db().await;
        let svc = bonus_drop_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);

        for bad in [
            request("", 100, Some(0)),
            request("Happy hour", 0, Some(0)),
            request("Happy hour", 100, Some(-5)),
            request("Happy hour", 100, None),
            ScheduleBonusDropRequest {
                fire_at: Some(now),
                ..request("Happy hour", 100, Some(10))
            },
        ] {
            assert!(matches!(
                svc.schedule(now, &bad).await,
                Err(AppError::ValidationError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_schedule_with_delay_attaches_to_today() {
        let db = setup_db().await;
        let svc = bonus_drop_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);

        let created = svc
            .schedule(now, &request(" Lunch bonus ", 500, Some(600)))
            .await
            .unwrap();
        assert_eq!(created.label, "Lunch bonus");
        assert_eq!(created.status, BonusDropStatus::Scheduled);
        assert_eq!(created.fire_at, now + Duration::seconds(600));

        let today = draw_service(&db).find_today(now).await.unwrap().unwrap();
        assert_eq!(created.draw_id, today.id);
        assert_eq!(svc.list_for_today(now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fire_due_respects_fire_time_and_limit() {
        let db = setup_db().await;
        let svc = bonus_drop_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = draw_service(&db).ensure_active_draw(now).await.unwrap();
        seed_tickets(&db, draw.id, 5, now).await;
        for minutes in [30, 20, 10] {
            seed_bonus_drop(&db, draw.id, now - Duration::minutes(minutes), now).await;
        }
        // 未到期
        seed_bonus_drop(&db, draw.id, now + Duration::minutes(5), now).await;

        let due = svc.due_drops(now, 10).await.unwrap();
        assert_eq!(due.len(), 3);
        assert!(due.windows(2).all(|w| w[0].fire_at <= w[1].fire_at));

        let first = svc.fire_due(now, 2).await.unwrap();
        assert_eq!(first.found, 2);
        assert_eq!(first.fired, 2);

        let second = svc.fire_due(now, 2).await.unwrap();
        assert_eq!(second.found, 1);
        assert_eq!(second.fired, 1);
        assert_eq!(second.failed, 0);

        assert_eq!(svc.fire_due(now, 2).await.unwrap().found, 0);
    }

    #[tokio::test]
    async fn test_fire_due_counts_cancellations() {
        let db = setup_db().await;
        let svc = bonus_drop_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = draw_service(&db).ensure_active_draw(now).await.unwrap();
        seed_bonus_drop(&db, draw.id, now, now).await;

        let summary = svc.fire_due(now, 10).await.unwrap();
        assert_eq!(
            summary,
            BonusCycleSummary {
                found: 1,
                cancelled_no_tickets: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_failing_drop_does_not_block_the_batch() {
        let db = setup_db().await;
        let svc = bonus_drop_service(&db);
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = draw_service(&db).ensure_active_draw(now).await.unwrap();
        seed_tickets(&db, draw.id, 3, now).await;
        let broken = seed_bonus_drop(&db, draw.id, now - Duration::minutes(20), now).await;
        let healthy = seed_bonus_drop(&db, draw.id, now - Duration::minutes(10), now).await;

        // 让第一条的认领写入直接报错
        db.execute_unprepared(&format!(
            "CREATE TRIGGER fail_bonus_claim BEFORE UPDATE OF claimed_at ON bonus_drops \
             WHEN NEW.id = {} BEGIN SELECT RAISE(ABORT, 'claim rejected'); END",
            broken.id
        ))
        .await
        .unwrap();

        let summary = svc.fire_due(now, 10).await.unwrap();
        assert_eq!(
            summary,
            BonusCycleSummary {
                found: 2,
                fired: 1,
                failed: 1,
                ..Default::default()
            }
        );

        let statuses: Vec<_> = drops::Entity::find()
            .order_by_asc(drops::Column::Id)
            .all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|d| (d.id, d.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (broken.id, BonusDropStatus::Scheduled),
                (healthy.id, BonusDropStatus::Fired),
            ]
        );
    }
}
