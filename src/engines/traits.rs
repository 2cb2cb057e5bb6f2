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

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功的HTTP状态码
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// 无效的地址
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// 目录项
///
/// 目录列表中的一行：子目录或文件名以及其最后修改时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// 去掉首尾斜杠后的链接目标
    pub name: String,
    /// 最后修改时间（UTC）
    pub timestamp: DateTime<Utc>,
}

/// 一次目录列表的结果
///
/// `warnings` 记录被跳过的行（缺少或无法解析时间列），由调用方写入运行日志
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<DirectoryEntry>,
    pub warnings: Vec<String>,
}

/// 目录引擎特质
///
/// 远端回放目录的只读访问接口，路径相对于根地址
#[async_trait]
pub trait DirectoryEngine: Send + Sync {
    /// 列出目录项，按时间升序；无法解析的行记入 `Listing::warnings`
    ///
    /// # 参数
    ///
    /// * `path` - 相对路径，空字符串表示根目录
    /// * `extension` - 只保留以此结尾的名称
    /// * `minimum` - 只保留时间不早于此值的目录项
    async fn list_entries(
        &self,
        path: &str,
        extension: Option<&str>,
        minimum: Option<DateTime<Utc>>,
    ) -> Result<Listing, EngineError>;

    /// 获取文本文件内容
    async fn fetch_text(&self, path: &str) -> Result<String, EngineError>;

    /// 相对路径对应的绝对地址
    fn url_for(&self, path: &str) -> String;
}
