// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 运行记录仓库（job_run_repository）：每次采集运行的溯源记录
/// - 玩家仓库（player_repository）：玩家身份的插入或获取与外部标识补写
/// - 对局仓库（match_repository）：对局去重写入、参与者批量写入与高水位查询
pub mod job_run_repository;
pub mod match_repository;
pub mod player_repository;
