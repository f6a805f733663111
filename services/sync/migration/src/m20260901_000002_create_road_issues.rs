use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key on user_id: issues pulled from the cloud may name
        // reporters that were never copied locally.
        manager
            .create_table(
                Table::create()
                    .table(RoadIssues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoadIssues::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoadIssues::Title).string().not_null())
                    .col(
                        ColumnDef::new(RoadIssues::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(RoadIssues::Latitude).double().not_null())
                    .col(ColumnDef::new(RoadIssues::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(RoadIssues::NiveauDanger)
                            .string()
                            .not_null()
                            .default("MOYEN"),
                    )
                    .col(
                        ColumnDef::new(RoadIssues::Status)
                            .string()
                            .not_null()
                            .default("EN_ATTENTE"),
                    )
                    .col(
                        ColumnDef::new(RoadIssues::Surface)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(RoadIssues::Budget)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(RoadIssues::UserId).string())
                    .col(
                        ColumnDef::new(RoadIssues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoadIssues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoadIssues::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(RoadIssues::ResolvedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(RoadIssues::Table)
                    .col(RoadIssues::CreatedAt)
                    .name("idx_road_issues_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoadIssues::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RoadIssues {
    Table,
    Id,
    Title,
    Description,
    Latitude,
    Longitude,
    NiveauDanger,
    Status,
    Surface,
    Budget,
    UserId,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    ResolvedAt,
}
