// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::EngineError;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 采集单元错误类型
///
/// 每个工作单元（一个玩家目录、一个对局文件）捕获自身错误并写入运行日志，
/// 不会向兄弟单元或上层传播
#[derive(Error, Debug)]
pub enum IngestError {
    /// 远端目录或文件获取失败
    #[error("Fetch error: {0}")]
    Fetch(#[from] EngineError),

    /// 数据解析失败
    #[error("Parse error: {0}")]
    Parse(String),

    /// 存储层拒绝写入
    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    /// 工作单元崩溃或被取消
    #[error("Worker error: {0}")]
    Worker(String),
}
