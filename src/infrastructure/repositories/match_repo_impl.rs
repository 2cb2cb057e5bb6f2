// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::match_player::MatchPlayer;
use crate::domain::models::replay_match::{MatchOutcome, ReplayMatch};
use crate::domain::repositories::match_repository::MatchRepository;
use crate::infrastructure::database::entities::{
    match_player as match_player_entity, replay_match as match_entity,
};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 对局仓库实现
///
/// `matches.replay_url` 上的唯一索引是去重的唯一依据
#[derive(Clone)]
pub struct MatchRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl MatchRepositoryImpl {
    /// 创建新的对局仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<match_entity::Model> for ReplayMatch {
    fn from(model: match_entity::Model) -> Self {
        Self {
            id: model.id,
            job_run_id: model.job_run_id,
            replay_url: model.replay_url,
            map: model.map,
            game_version: model.game_version,
            starting_cash: model.starting_cash,
            match_length_secs: model.match_length_secs,
            match_type: model.match_type,
            match_timestamp: model.match_timestamp.map(Into::into),
            replay_size_kb: model.replay_size_kb,
            replay_uploaded_by: model.replay_uploaded_by,
            replay_upload_timestamp: model.replay_upload_timestamp.map(Into::into),
            created_at: model.created_at.into(),
        }
    }
}

impl From<&ReplayMatch> for match_entity::ActiveModel {
    fn from(m: &ReplayMatch) -> Self {
        Self {
            id: Set(m.id),
            job_run_id: Set(m.job_run_id),
            replay_url: Set(m.replay_url.clone()),
            map: Set(m.map.clone()),
            game_version: Set(m.game_version.clone()),
            starting_cash: Set(m.starting_cash),
            match_length_secs: Set(m.match_length_secs),
            match_type: Set(m.match_type.clone()),
            match_timestamp: Set(m.match_timestamp.map(Into::into)),
            replay_size_kb: Set(m.replay_size_kb),
            replay_uploaded_by: Set(m.replay_uploaded_by),
            replay_upload_timestamp: Set(m.replay_upload_timestamp.map(Into::into)),
            created_at: Set(m.created_at.into()),
        }
    }
}

impl From<match_player_entity::Model> for MatchPlayer {
    fn from(model: match_player_entity::Model) -> Self {
        Self {
            id: model.id,
            match_id: model.match_id,
            player_id: model.player_id,
            team: model.team,
            army: model.army,
            created_at: model.created_at.into(),
        }
    }
}

impl From<&MatchPlayer> for match_player_entity::ActiveModel {
    fn from(p: &MatchPlayer) -> Self {
        Self {
            id: Set(p.id),
            match_id: Set(p.match_id),
            player_id: Set(p.player_id),
            team: Set(p.team),
            army: Set(p.army.clone()),
            created_at: Set(p.created_at.into()),
        }
    }
}

#[async_trait]
impl MatchRepository for MatchRepositoryImpl {
    async fn exists_by_replay_url(&self, replay_url: &str) -> Result<bool, RepositoryError> {
        let count = match_entity::Entity::find()
            .filter(match_entity::Column::ReplayUrl.eq(replay_url))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn insert_with_players(
        &self,
        replay_match: &ReplayMatch,
        players: &[MatchPlayer],
    ) -> Result<MatchOutcome, RepositoryError> {
        let txn = self.db.begin().await?;

        let inserted = match_entity::Entity::insert(match_entity::ActiveModel::from(replay_match))
            .on_conflict(
                OnConflict::column(match_entity::Column::ReplayUrl)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        if inserted == 0 {
            txn.rollback().await?;
            return Ok(MatchOutcome::DuplicateSkip);
        }

        if !players.is_empty() {
            match_player_entity::Entity::insert_many(
                players.iter().map(match_player_entity::ActiveModel::from),
            )
            .exec_without_returning(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(MatchOutcome::Inserted)
    }

    async fn latest_upload_timestamp(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let latest = match_entity::Entity::find()
            .filter(match_entity::Column::ReplayUploadTimestamp.is_not_null())
            .order_by_desc(match_entity::Column::ReplayUploadTimestamp)
            .one(self.db.as_ref())
            .await?;
        Ok(latest
            .and_then(|m| m.replay_upload_timestamp)
            .map(Into::into))
    }

    async fn find_by_replay_url(
        &self,
        replay_url: &str,
    ) -> Result<Option<ReplayMatch>, RepositoryError> {
        let model = match_entity::Entity::find()
            .filter(match_entity::Column::ReplayUrl.eq(replay_url))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_players(&self, match_id: Uuid) -> Result<Vec<MatchPlayer>, RepositoryError> {
        let models = match_player_entity::Entity::find()
            .filter(match_player_entity::Column::MatchId.eq(match_id))
            .order_by_asc(match_player_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(match_entity::Entity::find().count(self.db.as_ref()).await?)
    }
}
