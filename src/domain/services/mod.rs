// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 回放解析（replay_parser）：把回放摘要文本解析为结构化记录
/// - 运行追踪（run_tracker）：维护每次运行的溯源记录与日志
/// - 采集编排（ingest_service）：遍历远端目录并写入玩家与对局
pub mod ingest_service;
pub mod replay_parser;
pub mod run_tracker;
