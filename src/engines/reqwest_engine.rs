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

use crate::config::settings::IngestSettings;
use crate::engines::listing::parse_listing;
use crate::engines::traits::{DirectoryEngine, EngineError, Listing};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// 目录抓取引擎
///
/// 基于reqwest实现，所有请求共享一个连接池
#[derive(Clone)]
pub struct ReqwestEngine {
    client: reqwest::Client,
    base_url: String,
    excluded_fragments: Vec<String>,
}

impl ReqwestEngine {
    /// 根据采集配置创建引擎
    ///
    /// # 参数
    ///
    /// * `settings` - 采集配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 引擎实例
    /// * `Err(EngineError)` - 根地址非法或客户端构建失败
    pub fn new(settings: &IngestSettings) -> Result<Self, EngineError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|e| EngineError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(EngineError::InvalidUrl(settings.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            excluded_fragments: settings.excluded_name_fragments.clone(),
        })
    }

    async fn get(&self, url: &str, kind: &'static str) -> Result<String, EngineError> {
        let start = Instant::now();
        metrics::counter!("replayrs_fetches_total", "kind" => kind).increment(1);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            metrics::counter!("replayrs_fetch_failures_total", "kind" => kind).increment(1);
            return Err(EngineError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(
            "GET {} -> {} bytes in {}ms",
            url,
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body)
    }
}

#[async_trait]
impl DirectoryEngine for ReqwestEngine {
    async fn list_entries(
        &self,
        path: &str,
        extension: Option<&str>,
        minimum: Option<DateTime<Utc>>,
    ) -> Result<Listing, EngineError> {
        let url = self.url_for(path);
        let html = self.get(&url, "listing").await?;
        Ok(parse_listing(
            &html,
            extension,
            minimum,
            &self.excluded_fragments,
        ))
    }

    async fn fetch_text(&self, path: &str) -> Result<String, EngineError> {
        let url = self.url_for(path);
        self.get(&url, "replay").await
    }

    fn url_for(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
