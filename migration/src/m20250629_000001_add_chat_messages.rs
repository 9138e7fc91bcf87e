use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    MessageId,
    Sender,
    Receiver,
    Message,
    FileData,
    FilePath,
    FileName,
    FileType,
    FileSize,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 聊天记录表；附件既可内嵌 (file_data) 也可外部引用 (file_path)
        manager
            .create_table(
                Table::create()
                    .table(ChatMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatMessages::MessageId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatMessages::Sender).string_len(100).not_null())
                    .col(
                        ColumnDef::new(ChatMessages::Receiver)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChatMessages::Message).text().not_null())
                    .col(ColumnDef::new(ChatMessages::FileData).binary().null())
                    .col(ColumnDef::new(ChatMessages::FilePath).string_len(500).null())
                    .col(ColumnDef::new(ChatMessages::FileName).string_len(255).null())
                    .col(ColumnDef::new(ChatMessages::FileType).string_len(100).null())
                    .col(ColumnDef::new(ChatMessages::FileSize).big_integer().null())
                    .col(
                        ColumnDef::new(ChatMessages::CreatedAt)
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
                    .name("idx_chat_messages_pair")
                    .table(ChatMessages::Table)
                    .col(ChatMessages::Sender)
                    .col(ChatMessages::Receiver)
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
                    .table(ChatMessages::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
