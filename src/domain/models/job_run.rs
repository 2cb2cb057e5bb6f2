// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 采集运行记录
///
/// 每次采集调用对应一条记录，保存开始时间、耗时、累积的日志/错误行、
/// 成功标志以及本次运行使用的增量起点。创建时 `success=false`、
/// `duration_ms=None`，运行结束时（包括失败路径）被最终化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    /// 运行唯一标识符
    pub id: Uuid,
    /// 开始时间
    pub start_time: DateTime<Utc>,
    /// 运行耗时（毫秒），运行结束前为空
    pub duration_ms: Option<i64>,
    /// 日志与错误行，按追加顺序
    pub logs: Vec<String>,
    /// 是否成功完成
    pub success: bool,
    /// 本次运行新写入的对局数
    pub matches_loaded: i32,
    /// 本次运行新建的玩家数
    pub players_created: i32,
    /// 本次运行使用的增量起点（上传时间高水位）
    pub high_water_mark: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl JobRun {
    /// 创建一条新的运行记录
    pub fn new(high_water_mark: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            start_time: now,
            duration_ms: None,
            logs: Vec::new(),
            success: false,
            matches_loaded: 0,
            players_created: 0,
            high_water_mark,
            created_at: now,
            updated_at: now,
        }
    }

    /// 运行是否已经最终化
    pub fn is_finished(&self) -> bool {
        self.duration_ms.is_some()
    }
}
