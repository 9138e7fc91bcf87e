use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum ForgotCardTokens {
    Table,
    TokenId,
    UserId,
    Email,
    Phone,
    VerificationCode,
    Passcode,
    ExpiresAt,
    Verified,
    Used,
    UsedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PasswordResetTokens {
    Table,
    TokenId,
    UserId,
    Email,
    Phone,
    ResetCode,
    CodeType,
    ExpiresAt,
    Used,
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
                    .as_enum(Alias::new("reset_code_type"))
                    .values(vec![Alias::new("email"), Alias::new("sms")])
                    .to_owned(),
            )
            .await?;

        // 补卡通行码表；记录全量保留，只打标记不删除
        manager
            .create_table(
                Table::create()
                    .table(ForgotCardTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForgotCardTokens::TokenId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ForgotCardTokens::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ForgotCardTokens::Email).string_len(255).null())
                    .col(ColumnDef::new(ForgotCardTokens::Phone).string_len(32).null())
                    .col(
                        ColumnDef::new(ForgotCardTokens::VerificationCode)
                            .string_len(6)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ForgotCardTokens::Passcode)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForgotCardTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForgotCardTokens::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForgotCardTokens::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForgotCardTokens::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ForgotCardTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_forgot_card_tokens_user")
                    .table(ForgotCardTokens::Table)
                    .col(ForgotCardTokens::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_forgot_card_tokens_passcode")
                    .table(ForgotCardTokens::Table)
                    .col(ForgotCardTokens::Passcode)
                    .to_owned(),
            )
            .await?;

        // 密码重置验证码表
        manager
            .create_table(
                Table::create()
                    .table(PasswordResetTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordResetTokens::TokenId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::Email)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::Phone)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::ResetCode)
                            .string_len(6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::CodeType)
                            .custom(Alias::new("reset_code_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_password_reset_tokens_user")
                    .table(PasswordResetTokens::Table)
                    .col(PasswordResetTokens::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PasswordResetTokens::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ForgotCardTokens::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("reset_code_type")).to_owned())
            .await?;
        Ok(())
    }
}
