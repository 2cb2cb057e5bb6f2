// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::replay::ReplayRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 对局实体
///
/// 一次被采集的回放，`replay_url` 为自然键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayMatch {
    pub id: Uuid,
    /// 创建该对局的运行
    pub job_run_id: Uuid,
    /// 二进制回放文件地址，唯一
    pub replay_url: String,
    pub map: Option<String>,
    /// 游戏版本，无法解析时为 "Unknown"
    pub game_version: String,
    pub starting_cash: Option<i32>,
    /// 对局时长（秒）
    pub match_length_secs: Option<i64>,
    pub match_type: Option<String>,
    /// 回放文本中记录的对局时间
    pub match_timestamp: Option<DateTime<Utc>>,
    /// 回放文件大小（KB）
    pub replay_size_kb: Option<i32>,
    /// 上传者
    pub replay_uploaded_by: Uuid,
    /// 目录列表中的上传时间，用作增量游标
    pub replay_upload_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReplayMatch {
    /// 由解析结果构造对局
    pub fn from_record(
        record: &ReplayRecord,
        replay_url: String,
        replay_uploaded_by: Uuid,
        replay_upload_timestamp: Option<DateTime<Utc>>,
        job_run_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_run_id,
            replay_url,
            map: record.map.clone(),
            game_version: record.game_version.clone(),
            starting_cash: record.starting_cash,
            match_length_secs: record.match_length_secs,
            match_type: record.match_type.clone(),
            match_timestamp: record.match_timestamp,
            replay_size_kb: record.replay_size_kb,
            replay_uploaded_by,
            replay_upload_timestamp,
            created_at: Utc::now(),
        }
    }
}

/// 对局写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// 新写入
    Inserted,
    /// 相同地址的对局已存在，未做任何修改
    DuplicateSkip,
}
