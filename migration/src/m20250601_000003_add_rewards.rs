use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

use crate::m20250601_000001_create_draws_and_tickets::{Draws, Tickets};
use crate::m20250601_000002_add_bonus_drops::BonusDrops;

/// Rewards (中奖记录：主奖 main / 加奖 bonus)
#[derive(DeriveIden)]
enum Rewards {
    Table,
    Id,
    DrawId,
    TicketId,
    BonusDropId,
    Kind,
    Amount,
    PaidOut,
    SettlementRef,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 唯一性约束:
/// - 每期最多一条 main 记录 (部分唯一索引 WHERE kind = 'main')
/// - 同一期内一张票最多中一次 bonus (部分唯一索引 WHERE kind = 'bonus')
///
/// 部分索引语法 Postgres 与 SQLite 通用，直接用 SQL 创建。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rewards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rewards::DrawId).big_integer().not_null())
                    .col(ColumnDef::new(Rewards::TicketId).big_integer().not_null())
                    .col(ColumnDef::new(Rewards::BonusDropId).big_integer().null())
                    .col(ColumnDef::new(Rewards::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Rewards::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Rewards::PaidOut)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Rewards::SettlementRef).string_len(128).null())
                    .col(
                        ColumnDef::new(Rewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rewards_draw")
                            .from(Rewards::Table, Rewards::DrawId)
                            .to(Draws::Table, Draws::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rewards_ticket")
                            .from(Rewards::Table, Rewards::TicketId)
                            .to(Tickets::Table, Tickets::Id),
                    )
                    // 回滚 bonus drop 时保留中奖记录
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rewards_bonus_drop")
                            .from(Rewards::Table, Rewards::BonusDropId)
                            .to(BonusDrops::Table, BonusDrops::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rewards_created_at")
                    .table(Rewards::Table)
                    .col(Rewards::CreatedAt)
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        for sql in [
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_rewards_main_per_draw ON rewards (draw_id) WHERE kind = 'main'",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_rewards_bonus_ticket_draw ON rewards (ticket_id, draw_id) WHERE kind = 'bonus'",
        ] {
            conn.execute(Statement::from_string(
                manager.get_database_backend(),
                sql.to_string(),
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Rewards::Table).to_owned())
            .await?;
        Ok(())
    }
}
