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

use migration::{Migrator, MigratorTrait};
use replayrs::config::settings::Settings;
use replayrs::domain::services::ingest_service::IngestService;
use replayrs::engines::reqwest_engine::ReqwestEngine;
use replayrs::infrastructure::database::connection;
use replayrs::infrastructure::metrics::init_metrics;
use replayrs::infrastructure::repositories::job_run_repo_impl::JobRunRepositoryImpl;
use replayrs::infrastructure::repositories::match_repo_impl::MatchRepositoryImpl;
use replayrs::infrastructure::repositories::player_repo_impl::PlayerRepositoryImpl;
use replayrs::utils::telemetry;
use std::sync::Arc;
use tracing::{info, warn};

/// 主函数
///
/// 加载配置、连接并迁移数据库，执行一次增量采集后退出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting replayrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    let since = settings.ingest.since_timestamp()?;
    info!("Configuration loaded");

    // 3. Initialize Prometheus Metrics
    init_metrics(&settings.metrics);

    // 4. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 5. Initialize Components
    let engine = Arc::new(ReqwestEngine::new(&settings.ingest)?);
    let player_repo = Arc::new(PlayerRepositoryImpl::new(db.clone()));
    let match_repo = Arc::new(MatchRepositoryImpl::new(db.clone()));
    let job_run_repo = Arc::new(JobRunRepositoryImpl::new(db.clone()));

    let service = IngestService::new(
        engine,
        player_repo,
        match_repo,
        job_run_repo,
        settings.ingest.clone(),
    );

    // 6. Run one ingest pass
    let summary = service.run(since).await?;
    if summary.success {
        info!(
            "Job run {} finished: {} matches, {} new players, {} failed units in {}ms",
            summary.job_run_id,
            summary.matches_loaded,
            summary.players_created,
            summary.failed_units,
            summary.duration_ms
        );
    } else {
        warn!(
            "Job run {} did not complete, see its log for details ({} matches loaded)",
            summary.job_run_id, summary.matches_loaded
        );
    }

    Ok(())
}
