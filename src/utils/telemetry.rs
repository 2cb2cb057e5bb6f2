// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info,replayrs=debug";
const LOG_FORMAT_ENV: &str = "REPLAYRS_LOG_FORMAT";

/// 初始化日志
///
/// 过滤规则取自 `RUST_LOG`；`REPLAYRS_LOG_FORMAT=json` 时输出结构化 JSON 行。
/// 重复调用不会报错，后续调用不生效。
pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let layer = if wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref()) {
        fmt::layer().json().with_current_span(true).boxed()
    } else {
        fmt::layer().boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

pub(crate) fn wants_json(format: Option<&str>) -> bool {
    matches!(format.map(str::trim), Some(f) if f.eq_ignore_ascii_case("json"))
}
