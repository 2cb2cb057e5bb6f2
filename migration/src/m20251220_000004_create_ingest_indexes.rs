// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::m20251220_000002_create_players::Players;
use super::m20251220_000003_create_matches::{MatchPlayers, Matches};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_matches_replay_url")
                    .table(Matches::Table)
                    .col(Matches::ReplayUrl)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_matches_replay_upload_timestamp")
                    .table(Matches::Table)
                    .col(Matches::ReplayUploadTimestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_match_players_match_id")
                    .table(MatchPlayers::Table)
                    .col(MatchPlayers::MatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_players_external_id")
                    .table(Players::Table)
                    .col(Players::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Partial index: at most one name-only player per display name.
        // Same syntax on PostgreSQL and SQLite.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_players_name_only \
                 ON players (player_name) WHERE external_id IS NULL",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_players_name_only")
            .await?;

        for (name, table) in [
            ("idx_players_external_id", Players::Table.into_iden()),
            ("idx_match_players_match_id", MatchPlayers::Table.into_iden()),
            ("idx_matches_replay_upload_timestamp", Matches::Table.into_iden()),
            ("idx_matches_replay_url", Matches::Table.into_iden()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }

        Ok(())
    }
}
