// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 游戏版本无法解析时的占位值
pub const UNKNOWN_GAME_VERSION: &str = "Unknown";

/// 回放摘要的解析结果
///
/// 每个字段独立降级：未匹配的字段为空，游戏版本除外
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub game_version: String,
    pub map: Option<String>,
    pub starting_cash: Option<i32>,
    pub match_length_secs: Option<i64>,
    pub match_type: Option<String>,
    pub match_timestamp: Option<DateTime<Utc>>,
    pub replay_size_kb: Option<i32>,
    /// 先按队伍块顺序列出分队玩家，再列出未分队玩家
    pub players: Vec<RosterEntry>,
    /// 非致命的解析问题
    pub warnings: Vec<String>,
}

impl Default for ReplayRecord {
    fn default() -> Self {
        Self {
            game_version: UNKNOWN_GAME_VERSION.to_string(),
            map: None,
            starting_cash: None,
            match_length_secs: None,
            match_type: None,
            match_timestamp: None,
            replay_size_kb: None,
            players: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// 名单中的一名玩家
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_name: String,
    pub army: String,
    pub team: Option<i32>,
}
