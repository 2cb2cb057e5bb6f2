// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 对局参与者
///
/// 关联一个对局与一个玩家；`team` 为空表示未分队
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlayer {
    pub id: Uuid,
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub team: Option<i32>,
    /// 阵营
    pub army: String,
    pub created_at: DateTime<Utc>,
}

impl MatchPlayer {
    pub fn new(match_id: Uuid, player_id: Uuid, team: Option<i32>, army: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            player_id,
            team,
            army: army.to_string(),
            created_at: Utc::now(),
        }
    }
}
