// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::player::Player;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 玩家仓库特质
///
/// 并发单元可能同时创建同一个玩家，所有创建操作都必须是“插入或获取”，
/// 由存储层的唯一约束保证不会产生重复行。
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// 根据ID查找玩家
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Player>, RepositoryError>;

    /// 根据外部标识查找玩家
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Player>, RepositoryError>;

    /// 查找尚无外部标识的同名玩家
    ///
    /// 部分唯一索引保证这样的玩家至多一个
    async fn find_name_only(&self, player_name: &str) -> Result<Option<Player>, RepositoryError>;

    /// 按显示名获取或创建玩家
    ///
    /// 已存在同名玩家（无论是否带外部标识）时返回最早创建的一个；
    /// 否则创建一个只有名称的玩家
    ///
    /// # 返回值
    ///
    /// * `Ok((Player, bool))` - 玩家以及是否由本次调用创建
    async fn get_or_create_by_name(
        &self,
        player_name: &str,
        job_run_id: Uuid,
    ) -> Result<(Player, bool), RepositoryError>;

    /// 按外部标识获取或创建玩家
    ///
    /// # 返回值
    ///
    /// * `Ok((Player, bool))` - 玩家以及是否由本次调用创建
    async fn get_or_create_by_external_id(
        &self,
        player_name: &str,
        external_id: &str,
        job_run_id: Uuid,
    ) -> Result<(Player, bool), RepositoryError>;

    /// 为只有名称的玩家补写外部标识
    ///
    /// 仅当该玩家的外部标识仍为空时生效
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Player))` - 补写成功后的玩家
    /// * `Ok(None)` - 玩家已有外部标识，或该外部标识已被其他玩家占用
    async fn backfill_external_id(
        &self,
        id: Uuid,
        external_id: &str,
    ) -> Result<Option<Player>, RepositoryError>;

    /// 玩家总数
    async fn count(&self) -> Result<u64, RepositoryError>;
}
