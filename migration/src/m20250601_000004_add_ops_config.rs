use sea_orm_migration::prelude::*;

/// Ops config (单行配置：运营期望的自动化模式)
#[derive(DeriveIden)]
enum OpsConfig {
    Table,
    Id,
    Mode,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OpsConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OpsConfig::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OpsConfig::Mode)
                            .string_len(16)
                            .not_null()
                            .default("manual"),
                    )
                    .col(
                        ColumnDef::new(OpsConfig::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 初始化唯一一行 (id = 1)，默认手动模式
        let insert = Query::insert()
            .into_table(OpsConfig::Table)
            .columns([OpsConfig::Id, OpsConfig::Mode])
            .values_panic([1.into(), "manual".into()])
            .on_conflict(OnConflict::column(OpsConfig::Id).do_nothing().to_owned())
            .to_owned();
        let conn = manager.get_connection();
        conn.execute(manager.get_database_backend().build(&insert))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(OpsConfig::Table).to_owned())
            .await?;
        Ok(())
    }
}
