// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_run::JobRun;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 运行记录仓库特质
///
/// 运行记录只由运行追踪器写入：开始时创建，过程中检查点更新，结束时最终化
#[async_trait]
pub trait JobRunRepository: Send + Sync {
    /// 创建运行记录
    async fn create(&self, run: &JobRun) -> Result<JobRun, RepositoryError>;

    /// 覆盖写入耗时、日志、计数与成功标志
    ///
    /// # 返回值
    ///
    /// * `Err(RepositoryError::NotFound)` - 记录不存在
    async fn update(&self, run: &JobRun) -> Result<JobRun, RepositoryError>;

    /// 根据ID查找运行记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobRun>, RepositoryError>;
}
