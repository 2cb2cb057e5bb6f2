// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{DirectoryEntry, Listing};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::warn;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("valid cell selector"));

/// 目录列表中时间戳所在的列（从0开始）
const TIMESTAMP_COLUMN: usize = 2;

/// 解析目录列表HTML
///
/// 规则：
/// - 跳过表头单元格（`th`）内的链接
/// - 链接目标去掉首尾斜杠作为名称，名称包含任一排除片段的跳过
/// - 指定扩展名时，只保留以其结尾的名称
/// - 时间取所在表格行第三个单元格，格式 `YYYY-MM-DD HH:MM`，按UTC解释
/// - 早于 `minimum` 的目录项被丢弃，边界相等时保留
///
/// 结果按名称去重（后出现的覆盖先出现的），按时间升序排列。
/// 缺少时间列或时间无法解析的行被跳过，原因记入 `warnings`
///
/// # 参数
///
/// * `html` - 目录页面内容
/// * `extension` - 扩展名过滤
/// * `minimum` - 最小时间
/// * `excluded_fragments` - 元数据行的名称片段
pub fn parse_listing(
    html: &str,
    extension: Option<&str>,
    minimum: Option<DateTime<Utc>>,
    excluded_fragments: &[String],
) -> Listing {
    let document = Html::parse_document(html);
    let mut entries: HashMap<String, DateTime<Utc>> = HashMap::new();
    let mut warnings = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let name = href.trim_matches('/');

        if name.is_empty() || has_ancestor(&anchor, "th") {
            continue;
        }
        if excluded_fragments
            .iter()
            .any(|fragment| name.contains(fragment.as_str()))
        {
            continue;
        }
        if let Some(ext) = extension {
            if !name.ends_with(ext) {
                continue;
            }
        }

        let Some(row) = ancestor(&anchor, "tr") else {
            continue;
        };
        let cell_text = match row.select(&CELL_SELECTOR).nth(TIMESTAMP_COLUMN) {
            Some(cell) => cell.text().collect::<String>(),
            None => {
                let message = format!("Listing row for '{}' has no timestamp column", name);
                warn!("{}", message);
                warnings.push(message);
                continue;
            }
        };

        let timestamp = match parse_listing_timestamp(&cell_text) {
            Ok(ts) => ts,
            Err(e) => {
                let message = format!(
                    "Skipping '{}': malformed timestamp '{}': {}",
                    name,
                    cell_text.trim(),
                    e
                );
                warn!("{}", message);
                warnings.push(message);
                continue;
            }
        };

        if minimum.is_some_and(|min| timestamp < min) {
            continue;
        }

        entries.insert(name.to_string(), timestamp);
    }

    let mut sorted: Vec<DirectoryEntry> = entries
        .into_iter()
        .map(|(name, timestamp)| DirectoryEntry { name, timestamp })
        .collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.name.cmp(&b.name)));

    Listing {
        entries: sorted,
        warnings,
    }
}

/// 解析目录列表中的时间，补上秒字段后按UTC解释
pub fn parse_listing_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let with_seconds = format!("{}:00", raw.trim());
    NaiveDateTime::parse_from_str(&with_seconds, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
}

fn ancestor<'a>(element: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|parent| parent.value().name() == tag)
}

fn has_ancestor(element: &ElementRef<'_>, tag: &str) -> bool {
    ancestor(element, tag).is_some()
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
