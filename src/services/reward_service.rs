use crate::entities::{TicketStatus, reward_entity as rewards, ticket_entity as tickets};
use crate::error::{AppError, AppResult};
use crate::models::RewardResponse;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};

pub const DEFAULT_RECENT_LIMIT: u64 = 20;
pub const MAX_RECENT_LIMIT: u64 = 100;

#[derive(Clone)]
pub struct RewardService {
    pool: DatabaseConnection,
}

impl RewardService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 最近的中奖记录（main 与 bonus 混合，按时间倒序）
    pub async fn recent(&self, limit: Option<u64>) -> AppResult<Vec<RewardResponse>> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);
        let list = rewards::Entity::find()
            .order_by_desc(rewards::Column::CreatedAt)
            .order_by_desc(rewards::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 下游结算完成后回写；票同时由 WON 变为 CLAIMED
    pub async fn mark_paid(&self, reward_id: i64, settlement_ref: &str) -> AppResult<RewardResponse> {
        let settlement_ref = settlement_ref.trim();
        if settlement_ref.is_empty() || settlement_ref.len() > 128 {
            return Err(AppError::ValidationError(
                "settlement_ref must be 1-128 characters".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        // 条件更新：并发回写时只有一个能把 paid_out 从 false 改为 true
        let res = rewards::Entity::update_many()
            .col_expr(rewards::Column::PaidOut, Expr::value(true))
            .col_expr(
                rewards::Column::SettlementRef,
                Expr::value(Some(settlement_ref.to_string())),
            )
            .filter(rewards::Column::Id.eq(reward_id))
            .filter(rewards::Column::PaidOut.eq(false))
            .exec(&txn)
            .await?;

        let reward = rewards::Entity::find_by_id(reward_id).one(&txn).await?;
        let updated = match reward {
            Some(reward) if res.rows_affected == 1 => reward,
            Some(_) => {
                txn.rollback().await?;
                return Err(AppError::ValidationError(format!(
                    "Reward {reward_id} is already paid out"
                )));
            }
            None => {
                txn.rollback().await?;
                return Err(AppError::NotFound(format!("Reward {reward_id} not found")));
            }
        };
        let ticket_id = updated.ticket_id;

        tickets::Entity::update_many()
            .col_expr(tickets::Column::Status, Expr::value(TicketStatus::Claimed))
            .filter(tickets::Column::Id.eq(ticket_id))
            .filter(tickets::Column::Status.eq(TicketStatus::Won))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        log::info!("Reward {reward_id} marked paid ({settlement_ref})");
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SelectionOutcome;
    use crate::test_support::*;

    #[tokio::test]
    async fn test_recent_orders_newest_first_and_clamps_limit() {
        let db = setup_db().await;
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = draw_service(&db).ensure_active_draw(now).await.unwrap();
        seed_tickets(&db, draw.id, 3, now).await;
        let selector = selection_service(&db);
        for minutes in [1, 2, 3] {
            let at = now + chrono::Duration::minutes(minutes);
            let drop = seed_bonus_drop(&db, draw.id, at, at).await;
            selector.fire_bonus_drop(drop.id, at).await.unwrap();
        }

        let svc = RewardService::new(db.clone());
        let all = svc.recent(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        assert_eq!(svc.recent(Some(0)).await.unwrap().len(), 1);
        assert_eq!(svc.recent(Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mark_paid_claims_ticket() {
        let db = setup_db().await;
        let now = paris(2025, 6, 10, 12, 0, 0);
        let draw = draw_service(&db).ensure_active_draw(now).await.unwrap();
        seed_tickets(&db, draw.id, 1, now).await;
        let drop = seed_bonus_drop(&db, draw.id, now, now).await;
        let SelectionOutcome::Won { reward, ticket } = selection_service(&db)
            .fire_bonus_drop(drop.id, now)
            .await
            .unwrap()
        else {
            panic!("expected a winner");
        };

        let svc = RewardService::new(db.clone());
        assert!(matches!(
            svc.mark_paid(reward.id, "  ").await,
            Err(AppError::ValidationError(_))
        ));

        let paid = svc.mark_paid(reward.id, "5xTx").await.unwrap();
        assert!(paid.paid_out);
        assert_eq!(paid.settlement_ref.as_deref(), Some("5xTx"));

        let ticket = tickets::Entity::find_by_id(ticket.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Claimed);

        // 重复回写被拒绝，且不会覆盖已记录的结算凭证
        assert!(matches!(
            svc.mark_paid(reward.id, "other-ref").await,
            Err(AppError::ValidationError(_))
        ));
        let stored = rewards::Entity::find_by_id(reward.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.paid_out);
        assert_eq!(stored.settlement_ref.as_deref(), Some("5xTx"));
        assert!(matches!(
            svc.mark_paid(9999, "ref").await,
            Err(AppError::NotFound(_))
        ));
    }
}
