use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_draws_and_tickets::Draws;

/// Bonus drops (日内定时加奖)
#[derive(DeriveIden)]
pub(crate) enum BonusDrops {
    Table,
    Id,
    DrawId,
    Label,
    Amount,
    FireAt,
    Status,
    ClaimedAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BonusDrops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BonusDrops::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BonusDrops::DrawId).big_integer().not_null())
                    .col(ColumnDef::new(BonusDrops::Label).string_len(128).not_null())
                    .col(ColumnDef::new(BonusDrops::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(BonusDrops::FireAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BonusDrops::Status)
                            .string_len(16)
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(
                        ColumnDef::new(BonusDrops::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BonusDrops::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bonus_drops_draw")
                            .from(BonusDrops::Table, BonusDrops::DrawId)
                            .to(Draws::Table, Draws::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 到期扫描: status = scheduled AND fire_at <= now ORDER BY fire_at
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bonus_drops_status_fire_at")
                    .table(BonusDrops::Table)
                    .col(BonusDrops::Status)
                    .col(BonusDrops::FireAt)
                    .to_owned(),
            )
            .await?;

        // 回滚最近一条: draw_id + created_at
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bonus_drops_draw_created")
                    .table(BonusDrops::Table)
                    .col(BonusDrops::DrawId)
                    .col(BonusDrops::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(BonusDrops::Table).to_owned())
            .await?;
        Ok(())
    }
}
