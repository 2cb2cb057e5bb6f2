// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::run_tracker::RunLog;
use crate::utils::errors::IngestError;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Default)]
struct PendingUnits {
    count: AtomicUsize,
    idle: Notify,
}

/// 在单元结束（包括崩溃与取消）时归还计数
struct PendingGuard(Arc<PendingUnits>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// 有界工作池
///
/// 同时执行的单元数不超过 `max_workers`；每个单元的错误或崩溃都被捕获、
/// 写入运行日志并计数，不会影响兄弟单元。单元内部可以继续提交嵌套单元，
/// `wait_idle` 会等待包括嵌套单元在内的全部单元结束。
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    pending: Arc<PendingUnits>,
    failures: Arc<AtomicUsize>,
    log: RunLog,
}

impl WorkerPool {
    /// 创建工作池
    ///
    /// # 参数
    ///
    /// * `max_workers` - 并发上限，至少为1
    /// * `log` - 单元失败写入的运行日志
    pub fn new(max_workers: usize, log: RunLog) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_workers.max(1))),
            pending: Arc::new(PendingUnits::default()),
            failures: Arc::new(AtomicUsize::new(0)),
            log,
        }
    }

    /// 提交一个工作单元
    ///
    /// 立即返回；单元在拿到并发许可后才开始执行
    pub fn submit<T, F>(&self, label: impl Into<String>, unit: F) -> UnitHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, IngestError>> + Send + 'static,
    {
        let label = label.into();
        self.pending.count.fetch_add(1, Ordering::AcqRel);
        let guard = PendingGuard(self.pending.clone());

        let semaphore = self.semaphore.clone();
        let failures = self.failures.clone();
        let log = self.log.clone();
        let task_label = label.clone();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let result = async {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| IngestError::Worker(e.to_string()))?;
                debug!("Running unit {}", task_label);
                match AssertUnwindSafe(unit).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(IngestError::Worker(format!(
                        "unit panicked: {}",
                        panic_message(panic.as_ref())
                    ))),
                }
            }
            .await;

            if let Err(e) = &result {
                failures.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("replayrs_unit_failures_total").increment(1);
                log.error(format!("{} failed: {}", task_label, e));
            }
            result
        });

        UnitHandle { label, handle }
    }

    /// 等待全部已提交单元（包括嵌套提交的单元）结束
    ///
    /// 不能在池内单元中调用，否则会等待自身
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.pending.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// 已失败（错误或崩溃）的单元数
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

/// 已提交单元的句柄
pub struct UnitHandle<T> {
    label: String,
    handle: JoinHandle<Result<T, IngestError>>,
}

impl<T> UnitHandle<T> {
    /// 等待单元结束并取得结果
    pub async fn join(self) -> Result<T, IngestError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(IngestError::Worker(format!("{}: {}", self.label, e))),
        }
    }
}

/// 等待一组单元，按提交顺序返回各自结果
pub async fn await_all<T>(handles: Vec<UnitHandle<T>>) -> Vec<Result<T, IngestError>> {
    join_all(handles.into_iter().map(UnitHandle::join)).await
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
