use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum AccessLogs {
    Table,
    LogId,
    MemberId,
    CardId,
    GateId,
    Direction,
    Result,
    Timestamp,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("access_direction"))
                    .values(vec![Alias::new("in"), Alias::new("out")])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("access_result"))
                    .values(vec![Alias::new("granted"), Alias::new("denied")])
                    .to_owned(),
            )
            .await?;

        // 闸机进出记录，由门禁系统写入，后端只读
        manager
            .create_table(
                Table::create()
                    .table(AccessLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessLogs::LogId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::MemberId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccessLogs::CardId).big_integer().null())
                    .col(ColumnDef::new(AccessLogs::GateId).integer().not_null())
                    .col(
                        ColumnDef::new(AccessLogs::Direction)
                            .custom(Alias::new("access_direction"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::Result)
                            .custom(Alias::new("access_result"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_access_logs_member_time")
                    .table(AccessLogs::Table)
                    .col(AccessLogs::MemberId)
                    .col(AccessLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(AccessLogs::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("access_result")).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("access_direction")).to_owned())
            .await?;
        Ok(())
    }
}
