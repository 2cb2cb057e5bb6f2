// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 运行记录（job_run）：一次采集调用的溯源信息
/// - 玩家（player）：参与对局的玩家身份
/// - 对局（replay_match）：一次被采集的回放
/// - 对局参与者（match_player）：对局与玩家的关联
/// - 回放解析结果（replay）：从回放摘要文本提取的字段
pub mod job_run;
pub mod match_player;
pub mod player;
pub mod replay;
pub mod replay_match;
