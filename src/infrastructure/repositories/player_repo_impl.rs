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

use crate::domain::models::player::Player;
use crate::domain::repositories::player_repository::PlayerRepository;
use crate::infrastructure::database::entities::player as player_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 玩家仓库实现
///
/// 创建均为插入或忽略后重新读取，由 `players` 表上的唯一索引保证并发安全：
/// `external_id` 唯一，`player_name` 在 `external_id IS NULL` 的行中唯一
#[derive(Clone)]
pub struct PlayerRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl PlayerRepositoryImpl {
    /// 创建新的玩家仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_by_name(&self, player_name: &str) -> Result<Option<Player>, RepositoryError> {
        let model = player_entity::Entity::find()
            .filter(player_entity::Column::PlayerName.eq(player_name))
            .order_by_asc(player_entity::Column::CreatedAt)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    /// 插入或忽略，返回是否确实插入
    async fn insert_ignoring_conflict(
        &self,
        player: &Player,
        on_conflict: OnConflict,
    ) -> Result<bool, RepositoryError> {
        let rows = player_entity::Entity::insert(player_entity::ActiveModel::from(player))
            .on_conflict(on_conflict)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(rows == 1)
    }
}

impl From<player_entity::Model> for Player {
    fn from(model: player_entity::Model) -> Self {
        Self {
            id: model.id,
            job_run_id: model.job_run_id,
            player_name: model.player_name,
            external_id: model.external_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<&Player> for player_entity::ActiveModel {
    fn from(player: &Player) -> Self {
        Self {
            id: Set(player.id),
            job_run_id: Set(player.job_run_id),
            player_name: Set(player.player_name.clone()),
            external_id: Set(player.external_id.clone()),
            created_at: Set(player.created_at.into()),
            updated_at: Set(player.updated_at.into()),
        }
    }
}

#[async_trait]
impl PlayerRepository for PlayerRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Player>, RepositoryError> {
        let model = player_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Player>, RepositoryError> {
        let model = player_entity::Entity::find()
            .filter(player_entity::Column::ExternalId.eq(external_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_name_only(&self, player_name: &str) -> Result<Option<Player>, RepositoryError> {
        let model = player_entity::Entity::find()
            .filter(player_entity::Column::PlayerName.eq(player_name))
            .filter(player_entity::Column::ExternalId.is_null())
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn get_or_create_by_name(
        &self,
        player_name: &str,
        job_run_id: Uuid,
    ) -> Result<(Player, bool), RepositoryError> {
        if let Some(player) = self.find_by_name(player_name).await? {
            return Ok((player, false));
        }

        let player = Player::new(job_run_id, player_name, None);
        // the partial unique index has no column target usable on every backend
        if self
            .insert_ignoring_conflict(&player, OnConflict::new().do_nothing().to_owned())
            .await?
        {
            return Ok((player, true));
        }

        debug!("Player {} was created concurrently", player_name);
        self.find_by_name(player_name)
            .await?
            .map(|player| (player, false))
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_or_create_by_external_id(
        &self,
        player_name: &str,
        external_id: &str,
        job_run_id: Uuid,
    ) -> Result<(Player, bool), RepositoryError> {
        if let Some(player) = self.find_by_external_id(external_id).await? {
            return Ok((player, false));
        }

        let player = Player::new(job_run_id, player_name, Some(external_id));
        let on_conflict = OnConflict::column(player_entity::Column::ExternalId)
            .do_nothing()
            .to_owned();
        if self.insert_ignoring_conflict(&player, on_conflict).await? {
            return Ok((player, true));
        }

        debug!("Player with external id {} was created concurrently", external_id);
        self.find_by_external_id(external_id)
            .await?
            .map(|player| (player, false))
            .ok_or(RepositoryError::NotFound)
    }

    async fn backfill_external_id(
        &self,
        id: Uuid,
        external_id: &str,
    ) -> Result<Option<Player>, RepositoryError> {
        let now: chrono::DateTime<FixedOffset> = Utc::now().into();
        let result = player_entity::Entity::update_many()
            .col_expr(
                player_entity::Column::ExternalId,
                Expr::value(external_id.to_string()),
            )
            .col_expr(player_entity::Column::UpdatedAt, Expr::value(now))
            .filter(player_entity::Column::Id.eq(id))
            .filter(player_entity::Column::ExternalId.is_null())
            .exec(self.db.as_ref())
            .await;

        match result {
            Ok(updated) if updated.rows_affected == 1 => self.find_by_id(id).await,
            Ok(_) => Ok(None),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!("External id {} already belongs to another player", external_id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(player_entity::Entity::find().count(self.db.as_ref()).await?)
    }
}
