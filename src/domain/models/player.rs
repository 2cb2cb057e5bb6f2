// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 玩家实体
///
/// 外部标识在首次观察到之前可以为空；同一外部标识至多对应一个玩家
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    /// 首次创建该玩家的运行
    pub job_run_id: Uuid,
    pub player_name: String,
    /// 远端分配的稳定标识
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// 创建新的玩家
    pub fn new(job_run_id: Uuid, player_name: &str, external_id: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_run_id,
            player_name: player_name.to_string(),
            external_id: external_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.external_id {
            Some(external_id) => write!(f, "{} ({})", self.player_name, external_id),
            None => write!(f, "{}", self.player_name),
        }
    }
}

/// 玩家目录名
///
/// 远端玩家目录命名为 `<显示名>_<外部标识>`，显示名中可以包含下划线
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDirectory {
    pub player_name: String,
    pub external_id: Option<String>,
}

impl PlayerDirectory {
    /// 拆分目录名，最后一个下划线之后为外部标识
    pub fn parse(directory: &str) -> Self {
        match directory.rsplit_once('_') {
            Some((name, external_id)) if !name.is_empty() && !external_id.is_empty() => Self {
                player_name: name.to_string(),
                external_id: Some(external_id.to_string()),
            },
            _ => Self {
                player_name: directory.to_string(),
                external_id: None,
            },
        }
    }
}
