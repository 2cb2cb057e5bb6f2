// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 启用时在 `listen_addr` 上暴露Prometheus抓取端点；
/// 地址非法或端口被占用只记录警告，不影响采集
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(
        "replayrs_matches_ingested_total",
        "Total number of matches inserted"
    );
    describe_counter!(
        "replayrs_matches_skipped_total",
        "Total number of match files skipped because the replay was already ingested"
    );
    describe_counter!(
        "replayrs_players_created_total",
        "Total number of players created"
    );
    describe_counter!(
        "replayrs_unit_failures_total",
        "Total number of failed work units and listing branches"
    );
    describe_counter!(
        "replayrs_fetches_total",
        "Total number of requests sent to the replay directory"
    );
    describe_counter!(
        "replayrs_fetch_failures_total",
        "Total number of requests answered with a non-success status"
    );
    describe_histogram!(
        "replayrs_run_duration_seconds",
        "Wall-clock duration of ingest runs in seconds"
    );
}
