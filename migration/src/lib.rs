pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_membership;
mod m20250608_000001_add_points_ledger;
mod m20250615_000001_add_rewards;
mod m20250622_000001_add_access_logs;
mod m20250629_000001_add_chat_messages;
mod m20250706_000001_add_recovery_tokens;
mod m20250720_000001_add_vnpay_columns;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_membership::Migration),
            Box::new(m20250608_000001_add_points_ledger::Migration),
            Box::new(m20250615_000001_add_rewards::Migration),
            Box::new(m20250622_000001_add_access_logs::Migration),
            Box::new(m20250629_000001_add_chat_messages::Migration),
            Box::new(m20250706_000001_add_recovery_tokens::Migration),
            Box::new(m20250720_000001_add_vnpay_columns::Migration),
        ]
    }
}
