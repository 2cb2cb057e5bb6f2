// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::IngestSettings;
use crate::domain::models::match_player::MatchPlayer;
use crate::domain::models::player::{Player, PlayerDirectory};
use crate::domain::models::replay_match::{MatchOutcome, ReplayMatch};
use crate::domain::repositories::job_run_repository::JobRunRepository;
use crate::domain::repositories::match_repository::MatchRepository;
use crate::domain::repositories::player_repository::PlayerRepository;
use crate::domain::services::replay_parser::parse_replay;
use crate::domain::services::run_tracker::{RunContext, RunHandle, RunLog, RunTracker};
use crate::engines::traits::{DirectoryEngine, DirectoryEntry, Listing};
use crate::utils::errors::IngestError;
use crate::workers::pool::{await_all, WorkerPool};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// 一次采集运行的结果摘要
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub job_run_id: Uuid,
    /// 遍历是否完整结束；单元失败不影响该标志
    pub success: bool,
    pub matches_loaded: i32,
    pub players_created: i32,
    /// 失败的单元与分支数
    pub failed_units: usize,
    pub duration_ms: i64,
}

/// 采集编排服务
///
/// 按 月 → 日 → 玩家目录 → 对局文件 四层遍历远端目录。月与日顺序处理，
/// 每个玩家目录和每个对局文件都是工作池中的一个独立单元；
/// 一天的全部单元结束后才进入下一天，并写入一次进度快照。
///
/// 增量下限只作用于玩家目录和对局文件两层：目录的修改时间只随直接子项的
/// 增加而变化，已有日目录中新增的对局不会更新月、日目录的时间。
pub struct IngestService<E, P, M, J>
where
    E: DirectoryEngine + 'static,
    P: PlayerRepository + 'static,
    M: MatchRepository + 'static,
    J: JobRunRepository,
{
    engine: Arc<E>,
    players: Arc<P>,
    matches: Arc<M>,
    tracker: RunTracker<J>,
    settings: Arc<IngestSettings>,
}

impl<E, P, M, J> IngestService<E, P, M, J>
where
    E: DirectoryEngine + 'static,
    P: PlayerRepository + 'static,
    M: MatchRepository + 'static,
    J: JobRunRepository,
{
    pub fn new(
        engine: Arc<E>,
        players: Arc<P>,
        matches: Arc<M>,
        job_runs: Arc<J>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            engine,
            players,
            matches,
            tracker: RunTracker::new(job_runs),
            settings: Arc::new(settings),
        }
    }

    /// 执行一次增量采集
    ///
    /// # 参数
    ///
    /// * `since` - 手动指定的增量起点；为空时使用已入库对局的最新上传时间
    ///
    /// # 返回值
    ///
    /// * `Ok(RunSummary)` - 运行已最终化（无论遍历是否成功）
    /// * `Err(IngestError)` - 运行记录本身无法创建或最终化
    pub async fn run(&self, since: Option<DateTime<Utc>>) -> Result<RunSummary, IngestError> {
        let floor = match since {
            Some(since) => Some(since),
            None => self.matches.latest_upload_timestamp().await?,
        };

        let mut handle = self.tracker.start(floor).await?;
        let context = handle.context();
        match floor {
            Some(floor) => context
                .log()
                .info(format!("Ingesting entries uploaded at or after {}", floor)),
            None => context.log().info("No high-water mark, ingesting everything"),
        }

        let pool = WorkerPool::new(self.settings.max_workers, context.log().clone());
        let ingestor = Ingestor {
            engine: self.engine.clone(),
            matches: self.matches.clone(),
            resolver: PlayerResolver::new(self.players.clone(), context.clone()),
            settings: self.settings.clone(),
            context: context.clone(),
            pool: pool.clone(),
            floor,
        };

        let mut branch_failures = 0;
        let walked = self.walk(&ingestor, &mut handle, &mut branch_failures).await;

        // units submitted before an aborted walk still run to completion
        pool.wait_idle().await;

        let success = match walked {
            Ok(()) => true,
            Err(e) => {
                context.log().error(format!("Ingest aborted: {}", e));
                false
            }
        };

        let failed_units = pool.failure_count() + branch_failures;
        if failed_units > 0 {
            context
                .log()
                .info(format!("{} units failed, see errors above", failed_units));
        }

        let run = handle.finish(success).await?;
        Ok(RunSummary {
            job_run_id: run.id,
            success: run.success,
            matches_loaded: run.matches_loaded,
            players_created: run.players_created,
            failed_units,
            duration_ms: run.duration_ms.unwrap_or(0),
        })
    }

    async fn walk(
        &self,
        ingestor: &Ingestor<E, P, M>,
        handle: &mut RunHandle<J>,
        branch_failures: &mut usize,
    ) -> Result<(), IngestError> {
        let root = self.engine.list_entries("", None, None).await?;
        log_skipped_rows(handle.log(), "", &root);
        let months = root.entries;
        handle
            .log()
            .info(format!("Found {} month directories", months.len()));

        for month in months {
            if self.settings.ignored_months.contains(&month.name) {
                handle
                    .log()
                    .info(format!("Skipping ignored month {}", month.name));
                continue;
            }

            let days = match self.list_branch(handle, &month.name, None).await {
                Some(days) => days,
                None => {
                    *branch_failures += 1;
                    continue;
                }
            };

            for day in days {
                let day_path = format!("{}/{}", month.name, day.name);
                let directories = match self.list_branch(handle, &day_path, ingestor.floor).await
                {
                    Some(directories) => directories,
                    None => {
                        *branch_failures += 1;
                        continue;
                    }
                };

                handle.log().info(format!(
                    "Processing {} ({} player directories)",
                    day_path,
                    directories.len()
                ));

                let units = directories
                    .into_iter()
                    .map(|directory| {
                        let path = format!("{}/{}", day_path, directory.name);
                        let unit = ingestor.clone();
                        ingestor.pool.submit(format!("player {}", path), async move {
                            unit.ingest_player_directory(path, directory.name).await
                        })
                    })
                    .collect();
                await_all(units).await;
                // match units of this day were submitted by the player units
                ingestor.pool.wait_idle().await;

                if let Err(e) = handle.checkpoint().await {
                    handle
                        .log()
                        .error(format!("Checkpoint after {} failed: {}", day_path, e));
                }
            }
        }

        Ok(())
    }

    /// 列出分支目录；失败只放弃该分支
    async fn list_branch(
        &self,
        handle: &RunHandle<J>,
        path: &str,
        floor: Option<DateTime<Utc>>,
    ) -> Option<Vec<DirectoryEntry>> {
        match self.engine.list_entries(path, None, floor).await {
            Ok(listing) => {
                log_skipped_rows(handle.log(), path, &listing);
                Some(listing.entries)
            }
            Err(e) => {
                metrics::counter!("replayrs_unit_failures_total").increment(1);
                handle
                    .log()
                    .error(format!("Listing {} failed: {}", path, e));
                None
            }
        }
    }
}

/// 工作单元共享的采集上下文
struct Ingestor<E, P, M> {
    engine: Arc<E>,
    matches: Arc<M>,
    resolver: PlayerResolver<P>,
    settings: Arc<IngestSettings>,
    context: RunContext,
    pool: WorkerPool,
    floor: Option<DateTime<Utc>>,
}

impl<E, P, M> Clone for Ingestor<E, P, M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            matches: self.matches.clone(),
            resolver: self.resolver.clone(),
            settings: self.settings.clone(),
            context: self.context.clone(),
            pool: self.pool.clone(),
            floor: self.floor,
        }
    }
}

impl<E, P, M> Ingestor<E, P, M>
where
    E: DirectoryEngine + 'static,
    P: PlayerRepository + 'static,
    M: MatchRepository + 'static,
{
    /// 玩家目录单元：先解析上传者，再为每个对局文件提交一个子单元
    #[instrument(skip(self, path), fields(job_run_id = %self.context.job_run_id()))]
    async fn ingest_player_directory(
        self,
        path: String,
        directory: String,
    ) -> Result<(), IngestError> {
        let uploader = self
            .resolver
            .resolve_directory(&PlayerDirectory::parse(&directory))
            .await?;

        let listing = self
            .engine
            .list_entries(&path, Some(&self.settings.match_extension), self.floor)
            .await?;
        log_skipped_rows(self.context.log(), &path, &listing);
        let files = listing.entries;
        debug!("{} has {} match files for {}", path, files.len(), uploader);

        for file in files {
            let match_path = format!("{}/{}", path, file.name);
            let unit = self.clone();
            let uploader = uploader.clone();
            self.pool
                .submit(format!("match {}", match_path), async move {
                    unit.ingest_match(&match_path, file.timestamp, &uploader)
                        .await
                        .map(|_| ())
                });
        }

        Ok(())
    }

    /// 对局文件单元
    #[instrument(skip(self, uploader), fields(uploader = %uploader.player_name))]
    async fn ingest_match(
        &self,
        path: &str,
        uploaded_at: DateTime<Utc>,
        uploader: &Player,
    ) -> Result<MatchOutcome, IngestError> {
        let replay_url = self.replay_url_for(path);
        if self.matches.exists_by_replay_url(&replay_url).await? {
            metrics::counter!("replayrs_matches_skipped_total").increment(1);
            debug!("{} already ingested", replay_url);
            return Ok(MatchOutcome::DuplicateSkip);
        }

        let text = self.engine.fetch_text(path).await?;
        let record = parse_replay(&text);
        for warning in &record.warnings {
            self.context.log().warn(format!("{}: {}", path, warning));
        }

        let replay_match = ReplayMatch::from_record(
            &record,
            replay_url,
            uploader.id,
            Some(uploaded_at),
            self.context.job_run_id(),
        );

        let mut participants = Vec::with_capacity(record.players.len());
        for entry in &record.players {
            let player = if entry.player_name == uploader.player_name {
                uploader.clone()
            } else {
                self.resolver.resolve_name(&entry.player_name).await?
            };
            participants.push(MatchPlayer::new(
                replay_match.id,
                player.id,
                entry.team,
                &entry.army,
            ));
        }

        let outcome = self
            .matches
            .insert_with_players(&replay_match, &participants)
            .await?;
        match outcome {
            MatchOutcome::Inserted => {
                self.context.record_match();
                self.context.log().info(format!(
                    "Loaded {} ({} players)",
                    replay_match.replay_url,
                    participants.len()
                ));
            }
            MatchOutcome::DuplicateSkip => {
                metrics::counter!("replayrs_matches_skipped_total").increment(1);
                debug!("{} inserted concurrently", replay_match.replay_url);
            }
        }

        Ok(outcome)
    }

    fn replay_url_for(&self, path: &str) -> String {
        replay_url(
            &self.engine.url_for(path),
            &self.settings.match_extension,
            &self.settings.replay_extension,
        )
    }
}

/// 被跳过的目录行写入运行日志
fn log_skipped_rows(log: &RunLog, path: &str, listing: &Listing) {
    for warning in &listing.warnings {
        log.warn(format!("Listing /{}: {}", path, warning));
    }
}

/// 由摘要文件地址得到二进制回放地址
pub fn replay_url(text_url: &str, match_extension: &str, replay_extension: &str) -> String {
    match text_url.strip_suffix(match_extension) {
        Some(stem) => format!("{}{}", stem, replay_extension),
        None => text_url.to_string(),
    }
}

/// 玩家解析
///
/// 所有创建都经由仓库的“插入或获取”，本身不加锁
pub struct PlayerResolver<P> {
    players: Arc<P>,
    context: RunContext,
}

impl<P> Clone for PlayerResolver<P> {
    fn clone(&self) -> Self {
        Self {
            players: self.players.clone(),
            context: self.context.clone(),
        }
    }
}

impl<P: PlayerRepository> PlayerResolver<P> {
    pub fn new(players: Arc<P>, context: RunContext) -> Self {
        Self { players, context }
    }

    /// 解析玩家目录对应的上传者
    ///
    /// 先按外部标识查找；未命中时为同名且无外部标识的玩家补写外部标识；
    /// 没有这样的玩家（或补写被并发单元抢先）时按外部标识获取或创建。
    /// 已带其他外部标识的同名玩家不会被复用。
    pub async fn resolve_directory(
        &self,
        directory: &PlayerDirectory,
    ) -> Result<Player, IngestError> {
        let external_id = match directory.external_id.as_deref() {
            Some(external_id) => external_id,
            None => return self.resolve_name(&directory.player_name).await,
        };

        if let Some(player) = self.players.find_by_external_id(external_id).await? {
            return Ok(player);
        }

        if let Some(name_only) = self.players.find_name_only(&directory.player_name).await? {
            if let Some(player) = self
                .players
                .backfill_external_id(name_only.id, external_id)
                .await?
            {
                debug!("Backfilled external id for {}", player);
                return Ok(player);
            }
            // another unit backfilled this row or claimed the external id first
        }

        self.resolve_external_id(&directory.player_name, external_id)
            .await
    }

    /// 按显示名获取或创建玩家
    pub async fn resolve_name(&self, player_name: &str) -> Result<Player, IngestError> {
        let (player, created) = self
            .players
            .get_or_create_by_name(player_name, self.context.job_run_id())
            .await?;
        if created {
            self.context.record_player();
            self.context.log().info(format!("Created player {}", player));
        }
        Ok(player)
    }

    async fn resolve_external_id(
        &self,
        player_name: &str,
        external_id: &str,
    ) -> Result<Player, IngestError> {
        let (player, created) = self
            .players
            .get_or_create_by_external_id(player_name, external_id, self.context.job_run_id())
            .await?;
        if created {
            self.context.record_player();
            self.context.log().info(format!("Created player {}", player));
        }
        Ok(player)
    }
}

#[cfg(test)]
#[path = "ingest_service_test.rs"]
mod tests;
