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

use crate::domain::models::job_run::JobRun;
use crate::domain::repositories::job_run_repository::JobRunRepository;
use crate::infrastructure::database::entities::job_run as job_run_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 运行记录仓库实现
#[derive(Clone)]
pub struct JobRunRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRunRepositoryImpl {
    /// 创建新的运行记录仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<job_run_entity::Model> for JobRun {
    fn from(model: job_run_entity::Model) -> Self {
        Self {
            id: model.id,
            start_time: model.start_time.into(),
            duration_ms: model.duration_ms,
            logs: serde_json::from_value(model.logs).unwrap_or_default(),
            success: model.success,
            matches_loaded: model.matches_loaded,
            players_created: model.players_created,
            high_water_mark: model.high_water_mark.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

fn logs_to_json(logs: &[String]) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(logs)
        .map_err(|e| RepositoryError::Database(DbErr::Custom(format!("Invalid run logs: {}", e))))
}

#[async_trait]
impl JobRunRepository for JobRunRepositoryImpl {
    async fn create(&self, run: &JobRun) -> Result<JobRun, RepositoryError> {
        let model = job_run_entity::ActiveModel {
            id: Set(run.id),
            start_time: Set(run.start_time.into()),
            duration_ms: Set(run.duration_ms),
            logs: Set(logs_to_json(&run.logs)?),
            success: Set(run.success),
            matches_loaded: Set(run.matches_loaded),
            players_created: Set(run.players_created),
            high_water_mark: Set(run.high_water_mark.map(Into::into)),
            created_at: Set(run.created_at.into()),
            updated_at: Set(run.updated_at.into()),
        };

        let created = model.insert(self.db.as_ref()).await?;
        Ok(created.into())
    }

    async fn update(&self, run: &JobRun) -> Result<JobRun, RepositoryError> {
        let mut model: job_run_entity::ActiveModel = job_run_entity::Entity::find_by_id(run.id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?
            .into();

        model.duration_ms = Set(run.duration_ms);
        model.logs = Set(logs_to_json(&run.logs)?);
        model.success = Set(run.success);
        model.matches_loaded = Set(run.matches_loaded);
        model.players_created = Set(run.players_created);
        model.updated_at = Set(run.updated_at.into());

        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobRun>, RepositoryError> {
        let model = job_run_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }
}
