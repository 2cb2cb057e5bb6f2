// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::replay::{ReplayRecord, RosterEntry, UNKNOWN_GAME_VERSION};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static GAME_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Game Version:\s+Zero Hour ([\d.]+)").expect("game version regex"));
static MAP_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Map Name:\s+(?:maps/)?(.+)").expect("map name regex"));
static START_CASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Start Cash:\s+(\d+)").expect("start cash regex"));
static MATCH_LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Match Length:\s+([\d:]+)").expect("match length regex"));
static MATCH_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Match Type:\s+(.+)").expect("match type regex"));
static MATCH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Match Date \(UTC\):\s+(.+)").expect("match date regex"));
static REPLAY_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.rep \[(\d+) bytes\]").expect("replay size regex"));

// A "Team <N>" header followed by one or more player lines.
static TEAM_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Team (\d+)[ \t]*\n((?:[ \t]*\S+[ \t]+-?\S+[ \t]\([^)\n]+\)[ \t]*(?:\n|$))+)")
        .expect("team block regex")
});
// `<slot> <name> (<army>)`; names may start with a hyphen.
static PLAYER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*\S+\s+(-?\S+)\s\(([^)]+)\)[ \t]*$").expect("player line regex")
});

/// `Match Date (UTC)` 的格式，例如 `2024 Aug 03, 12:34:56`
const MATCH_DATE_FORMAT: &str = "%Y %b %d, %H:%M:%S";

const BYTES_PER_KB: i64 = 1024;

/// 解析回放摘要文本
///
/// 每个字段用一条正则独立提取，未匹配的字段为空（游戏版本为 "Unknown"）。
/// 解析过程从不失败，非致命问题记录在 `warnings` 中。
///
/// 名单分两步提取：先提取每个 `Team <N>` 块中的玩家并标注队伍号，
/// 再提取第一个 `Team ` 标记之前的未分队玩家（队伍为空）。
pub fn parse_replay(raw: &str) -> ReplayRecord {
    let text = raw.replace("\r\n", "\n");
    let mut record = ReplayRecord::default();

    if let Some(version) = capture(&GAME_VERSION, &text) {
        record.game_version = version.to_string();
    } else {
        record.game_version = UNKNOWN_GAME_VERSION.to_string();
    }

    record.map = capture(&MAP_NAME, &text).map(str::to_string);
    record.match_type = capture(&MATCH_TYPE, &text).map(str::to_string);

    if let Some(cash) = capture(&START_CASH, &text) {
        match cash.parse::<i32>() {
            Ok(value) => record.starting_cash = Some(value),
            Err(e) => record.warn(format!("Error parsing start cash '{}': {}", cash, e)),
        }
    }

    if let Some(length) = capture(&MATCH_LENGTH, &text) {
        match parse_match_length(length) {
            Some(secs) => record.match_length_secs = Some(secs),
            None => record.warn(format!("Error parsing match length '{}'", length)),
        }
    }

    if let Some(date) = capture(&MATCH_DATE, &text) {
        match parse_match_date(date) {
            Ok(ts) => record.match_timestamp = Some(ts),
            Err(e) => record.warn(format!("Error parsing date '{}': {}", date, e)),
        }
    }

    if let Some(bytes) = capture(&REPLAY_SIZE, &text) {
        match bytes
            .parse::<i64>()
            .ok()
            .and_then(|b| i32::try_from(b / BYTES_PER_KB).ok())
        {
            Some(kb) => record.replay_size_kb = Some(kb),
            None => record.warn(format!("Error parsing replay size '{}'", bytes)),
        }
    }

    record.players = extract_roster(&text, &mut record.warnings);
    record
}

/// 解析 `Match Date (UTC)` 的值
pub fn parse_match_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), MATCH_DATE_FORMAT).map(|naive| naive.and_utc())
}

/// 将 `H:MM:SS`、`MM:SS` 或纯秒数转换为秒
///
/// 格式不符或结果溢出 `i64` 时返回 `None`
pub fn parse_match_length(value: &str) -> Option<i64> {
    let parts = value
        .split(':')
        .map(|part| part.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [secs] => Some(*secs),
        [mins, secs] if *secs < 60 => mins.checked_mul(60)?.checked_add(*secs),
        [hours, mins, secs] if *mins < 60 && *secs < 60 => hours
            .checked_mul(3600)?
            .checked_add(mins * 60 + secs),
        _ => None,
    }
}

fn extract_roster(text: &str, warnings: &mut Vec<String>) -> Vec<RosterEntry> {
    let mut players = Vec::new();

    for block in TEAM_BLOCK.captures_iter(text) {
        let (Some(number), Some(lines)) = (block.get(1), block.get(2)) else {
            continue;
        };
        let team = match number.as_str().parse::<i32>() {
            Ok(team) => team,
            Err(e) => {
                let message = format!("Error parsing team number '{}': {}", number.as_str(), e);
                warn!("{}", message);
                warnings.push(message);
                continue;
            }
        };
        players.extend(roster_lines(lines.as_str(), Some(team)));
    }

    // Everything before the first team marker is unaffiliated.
    let unaffiliated = text.split("Team ").next().unwrap_or_default();
    players.extend(roster_lines(unaffiliated, None));

    players
}

fn roster_lines(section: &str, team: Option<i32>) -> impl Iterator<Item = RosterEntry> + '_ {
    PLAYER_LINE.captures_iter(section).filter_map(move |line| {
        Some(RosterEntry {
            player_name: line.get(1)?.as_str().to_string(),
            army: line.get(2)?.as_str().trim().to_string(),
            team,
        })
    })
}

fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|value| !value.is_empty())
}

impl ReplayRecord {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

#[cfg(test)]
#[path = "replay_parser_test.rs"]
mod tests;
