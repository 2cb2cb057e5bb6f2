// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Utc};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 默认的回放目录根地址
pub const DEFAULT_BASE_URL: &str = "https://gentool.net/data/zh";

/// 应用程序配置设置
///
/// 包含数据库、采集任务和指标导出等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 采集配置
    pub ingest: IngestSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 采集配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct IngestSettings {
    /// 远端目录根地址
    pub base_url: String,
    /// 工作池并发上限
    pub max_workers: usize,
    /// 单次HTTP请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 对局摘要文件扩展名
    pub match_extension: String,
    /// 二进制回放文件扩展名
    pub replay_extension: String,
    /// 跳过的月份目录
    pub ignored_months: Vec<String>,
    /// 名称包含这些片段的目录项视为元数据行
    pub excluded_name_fragments: Vec<String>,
    /// 手动指定的增量起点（RFC 3339），覆盖数据库中的高水位
    pub since: Option<String>,
    /// HTTP User-Agent
    pub user_agent: String,
}

/// 指标导出配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 监听地址
    pub listen_addr: String,
}

impl IngestSettings {
    /// 解析手动指定的增量起点
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(DateTime<Utc>))` - 配置了合法的起点
    /// * `Ok(None)` - 未配置起点
    /// * `Err(ConfigError)` - 起点格式非法
    pub fn since_timestamp(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        match self.since.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(|e| ConfigError::Message(format!("invalid ingest.since '{}': {}", raw, e))),
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_workers: 200,
            request_timeout_secs: 30,
            match_extension: ".txt".to_string(),
            replay_extension: ".rep".to_string(),
            ignored_months: vec![
                "2024_04_April".to_string(),
                "2024_05_May".to_string(),
                "2024_06_June".to_string(),
                "2024_07_July".to_string(),
            ],
            excluded_name_fragments: vec!["data".to_string(), "logs".to_string()],
            since: None,
            user_agent: "replayrs/0.1 (+https://github.com/Kirky-X/replayrs)".to_string(),
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `REPLAYRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let defaults = IngestSettings::default();
        let builder = Config::builder()
            // Default DB pool settings
            .set_default("database.url", "sqlite://replayrs.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default ingest settings
            .set_default("ingest.base_url", defaults.base_url)?
            .set_default("ingest.max_workers", defaults.max_workers as u64)?
            .set_default("ingest.request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("ingest.match_extension", defaults.match_extension)?
            .set_default("ingest.replay_extension", defaults.replay_extension)?
            .set_default("ingest.ignored_months", defaults.ignored_months)?
            .set_default(
                "ingest.excluded_name_fragments",
                defaults.excluded_name_fragments,
            )?
            .set_default("ingest.user_agent", defaults.user_agent)?
            // Default metrics settings
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("REPLAYRS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ingest.ignored_months")
                    .with_list_parse_key("ingest.excluded_name_fragments")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        if settings.ingest.max_workers == 0 {
            return Err(ConfigError::Message(
                "ingest.max_workers must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
