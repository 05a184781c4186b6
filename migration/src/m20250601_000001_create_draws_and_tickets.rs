use sea_orm_migration::prelude::*;

/// Draws (每日开奖，一个自然日一条)
#[derive(DeriveIden)]
pub(crate) enum Draws {
    Table,
    Id,
    DayBucket,
    Status,
    CloseAt,
    CloseOverridden,
    PoolAmount,
    ClaimedAt,
    ResolvedAt,
    WinningTicketId,
    CreatedAt,
    UpdatedAt,
}

/// Tickets (参与记录，归属唯一一期 draw)
#[derive(DeriveIden)]
pub(crate) enum Tickets {
    Table,
    Id,
    DrawId,
    Code,
    Wallet,
    Status,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 状态字段统一使用字符串列（open / closed / completed 等），
/// 同时兼容 Postgres 与 SQLite。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Draws::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Draws::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Draws::DayBucket)
                            .timestamp_with_time_zone()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Draws::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(Draws::CloseAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Draws::CloseOverridden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Draws::PoolAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Draws::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Draws::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Draws::WinningTicketId).big_integer().null())
                    .col(
                        ColumnDef::new(Draws::CreatedAt)
                            .timestamp_with_time_zone()
                            .null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Draws::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 自动开奖扫描: close_at <= now AND resolved_at IS NULL
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draws_close_at")
                    .table(Draws::Table)
                    .col(Draws::CloseAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::DrawId).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::Code).string_len(32).not_null())
                    .col(ColumnDef::new(Tickets::Wallet).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string_len(16)
                            .not_null()
                            .default("in_draw"),
                    )
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_draw")
                            .from(Tickets::Table, Tickets::DrawId)
                            .to(Draws::Table, Draws::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 抽奖池查询: draw_id + status
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_draw_status")
                    .table(Tickets::Table)
                    .col(Tickets::DrawId)
                    .col(Tickets::Status)
                    .to_owned(),
            )
            .await?;

        // 同一期内票号唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_draw_code_unique")
                    .table(Tickets::Table)
                    .col(Tickets::DrawId)
                    .col(Tickets::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Tickets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Draws::Table).to_owned())
            .await?;
        Ok(())
    }
}
