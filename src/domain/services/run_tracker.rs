// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_run::JobRun;
use crate::domain::repositories::job_run_repository::JobRunRepository;
use crate::utils::errors::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 单次运行的日志集合
///
/// 每次运行独立持有，按引用传入每个工作单元；并发追加不会丢行，
/// 不同单元之间的行顺序不作保证
#[derive(Clone, Default)]
pub struct RunLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条普通日志
    pub fn info(&self, message: impl AsRef<str>) {
        info!("{}", message.as_ref());
        self.push(message.as_ref());
    }

    /// 记录一条非致命问题
    pub fn warn(&self, message: impl AsRef<str>) {
        warn!("{}", message.as_ref());
        self.push(&format!("WARNING: {}", message.as_ref()));
    }

    /// 记录一条错误
    pub fn error(&self, message: impl AsRef<str>) {
        error!("{}", message.as_ref());
        self.push(&format!("ERROR: {}", message.as_ref()));
    }

    fn push(&self, message: &str) {
        let stamped = format!(
            "[{}] {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message
        );
        self.lines.lock().push(stamped);
    }

    /// 当前全部日志行的副本
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct RunCounters {
    matches_loaded: AtomicI32,
    players_created: AtomicI32,
}

/// 工作单元可见的运行上下文
///
/// 廉价克隆，传入每个并发单元
#[derive(Clone)]
pub struct RunContext {
    job_run_id: Uuid,
    log: RunLog,
    counters: Arc<RunCounters>,
}

impl RunContext {
    pub fn job_run_id(&self) -> Uuid {
        self.job_run_id
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// 记录新写入一个对局
    pub fn record_match(&self) {
        self.counters.matches_loaded.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("replayrs_matches_ingested_total").increment(1);
    }

    /// 记录新建一个玩家
    pub fn record_player(&self) {
        self.counters.players_created.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("replayrs_players_created_total").increment(1);
    }

    pub fn matches_loaded(&self) -> i32 {
        self.counters.matches_loaded.load(Ordering::Relaxed)
    }

    pub fn players_created(&self) -> i32 {
        self.counters.players_created.load(Ordering::Relaxed)
    }
}

/// 运行追踪器
///
/// 每次运行创建一条溯源记录，过程中累积日志，结束时写入耗时与成功标志
pub struct RunTracker<J: JobRunRepository> {
    repo: Arc<J>,
}

impl<J: JobRunRepository> RunTracker<J> {
    pub fn new(repo: Arc<J>) -> Self {
        Self { repo }
    }

    /// 开始一次运行
    ///
    /// 以当前时间创建记录，耗时为空，`success=false`
    ///
    /// # 参数
    ///
    /// * `high_water_mark` - 本次运行使用的增量起点
    pub async fn start(
        &self,
        high_water_mark: Option<DateTime<Utc>>,
    ) -> Result<RunHandle<J>, RepositoryError> {
        let run = self.repo.create(&JobRun::new(high_water_mark)).await?;
        info!("Started job run {} at {}", run.id, run.start_time);

        Ok(RunHandle {
            context: RunContext {
                job_run_id: run.id,
                log: RunLog::new(),
                counters: Arc::new(RunCounters::default()),
            },
            run,
            started: Instant::now(),
            repo: self.repo.clone(),
        })
    }
}

/// 进行中的运行
///
/// `finish` 消耗句柄，因此每次运行只能最终化一次
pub struct RunHandle<J: JobRunRepository> {
    run: JobRun,
    context: RunContext,
    started: Instant,
    repo: Arc<J>,
}

impl<J: JobRunRepository> RunHandle<J> {
    pub fn id(&self) -> Uuid {
        self.run.id
    }

    pub fn context(&self) -> RunContext {
        self.context.clone()
    }

    pub fn log(&self) -> &RunLog {
        &self.context.log
    }

    /// 写入进度快照（日志与计数），不改变完成状态
    pub async fn checkpoint(&mut self) -> Result<(), RepositoryError> {
        self.sync_progress();
        self.run = self.repo.update(&self.run).await?;
        Ok(())
    }

    /// 最终化运行：计算耗时、写入全部日志与成功标志
    pub async fn finish(mut self, success: bool) -> Result<JobRun, RepositoryError> {
        self.sync_progress();
        let elapsed_ms = i64::try_from(self.started.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.run.duration_ms = Some(elapsed_ms.max(0));
        self.run.success = success;

        metrics::histogram!("replayrs_run_duration_seconds")
            .record(self.started.elapsed().as_secs_f64());

        match self.repo.update(&self.run).await {
            Ok(run) => {
                info!(
                    "Finished job run {} success={} matches={} players={} in {}ms",
                    run.id,
                    run.success,
                    run.matches_loaded,
                    run.players_created,
                    elapsed_ms
                );
                Ok(run)
            }
            Err(e) => {
                error!("Failed to finalize job run {}: {}", self.run.id, e);
                Err(e)
            }
        }
    }

    fn sync_progress(&mut self) {
        self.run.logs = self.context.log.snapshot();
        self.run.matches_loaded = self.context.matches_loaded();
        self.run.players_created = self.context.players_created();
        self.run.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[path = "run_tracker_test.rs"]
mod tests;
