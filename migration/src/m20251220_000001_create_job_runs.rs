// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobRuns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JobRuns::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(JobRuns::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JobRuns::DurationMs).big_integer())
                    .col(ColumnDef::new(JobRuns::Logs).json().not_null())
                    .col(
                        ColumnDef::new(JobRuns::Success)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(JobRuns::MatchesLoaded)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JobRuns::PlayersCreated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(JobRuns::HighWaterMark).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(JobRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobRuns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_job_runs_start_time")
                    .table(JobRuns::Table)
                    .col(JobRuns::StartTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum JobRuns {
    Table,
    Id,
    StartTime,
    DurationMs,
    Logs,
    Success,
    MatchesLoaded,
    PlayersCreated,
    HighWaterMark,
    CreatedAt,
    UpdatedAt,
}
