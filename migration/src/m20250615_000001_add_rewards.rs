use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Rewards {
    Table,
    RewardId,
    Name,
    Description,
    PointsRequired,
    RewardType,
    RelatedPlanId,
    Quantity,
    Active,
    DeletedAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("reward_type"))
                    .values(vec![Alias::new("generic"), Alias::new("subscription")])
                    .to_owned(),
            )
            .await?;

        // 积分兑换礼品表，quantity 为 NULL 表示不限量
        manager
            .create_table(
                Table::create()
                    .table(Rewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rewards::RewardId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rewards::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Rewards::Description).text().null())
                    .col(
                        ColumnDef::new(Rewards::PointsRequired)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rewards::RewardType)
                            .custom(Alias::new("reward_type"))
                            .not_null()
                            .default(Expr::cust("'generic'::reward_type")),
                    )
                    .col(ColumnDef::new(Rewards::RelatedPlanId).big_integer().null())
                    .col(ColumnDef::new(Rewards::Quantity).integer().null())
                    .col(
                        ColumnDef::new(Rewards::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Rewards::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Rewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Rewards::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("reward_type")).to_owned())
            .await?;
        Ok(())
    }
}
