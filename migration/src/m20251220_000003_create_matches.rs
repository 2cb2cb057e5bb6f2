// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::m20251220_000001_create_job_runs::JobRuns;
use super::m20251220_000002_create_players::Players;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Matches::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Matches::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Matches::JobRunId).uuid().not_null())
                    .col(ColumnDef::new(Matches::ReplayUrl).string_len(500).not_null())
                    .col(ColumnDef::new(Matches::Map).string_len(255))
                    .col(ColumnDef::new(Matches::GameVersion).string_len(10).not_null())
                    .col(ColumnDef::new(Matches::StartingCash).integer())
                    .col(ColumnDef::new(Matches::MatchLengthSecs).big_integer())
                    .col(ColumnDef::new(Matches::MatchType).string_len(20))
                    .col(ColumnDef::new(Matches::MatchTimestamp).timestamp_with_time_zone())
                    .col(ColumnDef::new(Matches::ReplaySizeKb).integer())
                    .col(ColumnDef::new(Matches::ReplayUploadedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Matches::ReplayUploadTimestamp)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(Matches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_matches_job_run")
                            .from(Matches::Table, Matches::JobRunId)
                            .to(JobRuns::Table, JobRuns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_matches_uploaded_by")
                            .from(Matches::Table, Matches::ReplayUploadedBy)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MatchPlayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MatchPlayers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MatchPlayers::MatchId).uuid().not_null())
                    .col(ColumnDef::new(MatchPlayers::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(MatchPlayers::Team).integer())
                    .col(ColumnDef::new(MatchPlayers::Army).string_len(25).not_null())
                    .col(
                        ColumnDef::new(MatchPlayers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_match_players_match")
                            .from(MatchPlayers::Table, MatchPlayers::MatchId)
                            .to(Matches::Table, Matches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_match_players_player")
                            .from(MatchPlayers::Table, MatchPlayers::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MatchPlayers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Matches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Matches {
    Table,
    Id,
    JobRunId,
    ReplayUrl,
    Map,
    GameVersion,
    StartingCash,
    MatchLengthSecs,
    MatchType,
    MatchTimestamp,
    ReplaySizeKb,
    ReplayUploadedBy,
    ReplayUploadTimestamp,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum MatchPlayers {
    Table,
    Id,
    MatchId,
    PlayerId,
    Team,
    Army,
    CreatedAt,
}
