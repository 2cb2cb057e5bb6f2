// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::match_player::MatchPlayer;
use crate::domain::models::replay_match::{MatchOutcome, ReplayMatch};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 对局仓库特质
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// 检查回放地址是否已存在
    async fn exists_by_replay_url(&self, replay_url: &str) -> Result<bool, RepositoryError>;

    /// 写入对局及其全部参与者
    ///
    /// 在一个事务中完成：对局按 `replay_url` 插入或忽略，
    /// 只有在对局确实被插入时才批量写入参与者
    ///
    /// # 返回值
    ///
    /// * `Ok(MatchOutcome::Inserted)` - 新写入
    /// * `Ok(MatchOutcome::DuplicateSkip)` - 地址已存在，未做修改
    async fn insert_with_players(
        &self,
        replay_match: &ReplayMatch,
        players: &[MatchPlayer],
    ) -> Result<MatchOutcome, RepositoryError>;

    /// 所有对局中最新的上传时间，用作增量高水位
    async fn latest_upload_timestamp(&self) -> Result<Option<DateTime<Utc>>, RepositoryError>;

    /// 根据回放地址查找对局
    async fn find_by_replay_url(
        &self,
        replay_url: &str,
    ) -> Result<Option<ReplayMatch>, RepositoryError>;

    /// 查找对局的参与者
    async fn find_players(&self, match_id: Uuid) -> Result<Vec<MatchPlayer>, RepositoryError>;

    /// 对局总数
    async fn count(&self) -> Result<u64, RepositoryError>;
}
