use sea_orm::Statement;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Payments {
    Table,
    VnpayTransactionId,
    VnpayResponseCode,
    VnpayBankCode,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append new enum value 'vnpay' to payment_method
        let stmt = Statement::from_string(
            manager.get_database_backend(),
            "ALTER TYPE payment_method ADD VALUE IF NOT EXISTS 'vnpay'".to_string(),
        );
        manager.get_connection().execute(stmt).await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .add_column(
                        ColumnDef::new(Payments::VnpayTransactionId)
                            .string_len(64)
                            .null(),
                    )
                    .add_column(
                        ColumnDef::new(Payments::VnpayResponseCode)
                            .string_len(8)
                            .null(),
                    )
                    .add_column(ColumnDef::new(Payments::VnpayBankCode).string_len(32).null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .drop_column(Payments::VnpayBankCode)
                    .drop_column(Payments::VnpayResponseCode)
                    .drop_column(Payments::VnpayTransactionId)
                    .to_owned(),
            )
            .await?;
        // No easy way to drop enum value in PostgreSQL; noop
        Ok(())
    }
}
