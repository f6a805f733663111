use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SyncLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SyncLogs::Entity).string().not_null())
                    .col(ColumnDef::new(SyncLogs::EntityId).string().not_null())
                    .col(ColumnDef::new(SyncLogs::Action).string().not_null())
                    .col(ColumnDef::new(SyncLogs::Data).json_binary().not_null())
                    .col(
                        ColumnDef::new(SyncLogs::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncLogs::LastError).text())
                    .col(
                        ColumnDef::new(SyncLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SyncLogs::SyncedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Push poll query: deliverable entries in creation order.
        manager
            .create_index(
                Index::create()
                    .table(SyncLogs::Table)
                    .col(SyncLogs::Status)
                    .col(SyncLogs::CreatedAt)
                    .name("idx_sync_logs_status_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SyncLogs {
    Table,
    Id,
    Entity,
    EntityId,
    Action,
    Data,
    Status,
    Attempts,
    LastError,
    CreatedAt,
    SyncedAt,
}
