pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_draws_and_tickets;
mod m20250601_000002_add_bonus_drops;
mod m20250601_000003_add_rewards;
mod m20250601_000004_add_ops_config;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_draws_and_tickets::Migration),
            Box::new(m20250601_000002_add_bonus_drops::Migration),
            Box::new(m20250601_000003_add_rewards::Migration),
            Box::new(m20250601_000004_add_ops_config::Migration),
        ]
    }
}
