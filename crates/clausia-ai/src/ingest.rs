//! Background ingestion with pollable task status.
//!
//! Each submitted job runs on its own tokio task. Callers get a [`TaskId`]
//! back immediately and can poll [`IngestionQueue::status`] or await
//! [`IngestionQueue::wait`]. A failed job never affects the upload that
//! produced it; the error is logged and kept in the status table.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use clausia_core::Extraction;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::http::{BackendClient, BackendError, IngestionJob, IngestionReport};

/// Runs one ingestion job to completion.
#[async_trait]
pub trait IngestionRunner: Send + Sync + 'static {
    async fn run(&self, job: &IngestionJob) -> Result<IngestionReport, BackendError>;
}

#[async_trait]
impl IngestionRunner for BackendClient {
    async fn run(&self, job: &IngestionJob) -> Result<IngestionReport, BackendError> {
        self.ingest(job).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ingest-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded(Extraction),
    Failed(String),
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

type StatusTable = Arc<Mutex<HashMap<TaskId, TaskStatus>>>;

pub struct IngestionQueue<R: IngestionRunner> {
    runner: Arc<R>,
    statuses: StatusTable,
    handles: Mutex<HashMap<TaskId, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl<R: IngestionRunner> IngestionQueue<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
            statuses: Arc::new(Mutex::new(HashMap::new())),
            handles: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue a job. Must be called from within a tokio runtime.
    pub fn submit(&self, job: IngestionJob) -> TaskId {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.statuses).insert(id, TaskStatus::Pending);

        let runner = Arc::clone(&self.runner);
        let statuses = Arc::clone(&self.statuses);
        let handle = tokio::spawn(async move {
            lock(&statuses).insert(id, TaskStatus::Running);
            let status = match runner.run(&job).await {
                Ok(report) => {
                    info!(task = %id, contract_id = %job.contract_id, "ingestion succeeded");
                    TaskStatus::Succeeded(report.into_extraction())
                }
                Err(e) => {
                    error!(task = %id, contract_id = %job.contract_id, error = %e, "ingestion failed");
                    TaskStatus::Failed(e.to_string())
                }
            };
            lock(&statuses).insert(id, status);
        });
        lock(&self.handles).insert(id, handle);
        info!(task = %id, "ingestion queued");
        id
    }

    /// Current status, or `None` for an id this queue never issued.
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        lock(&self.statuses).get(&id).cloned()
    }

    /// Wait for a task to finish and return its final status.
    pub async fn wait(&self, id: TaskId) -> Option<TaskStatus> {
        let handle = lock(&self.handles).remove(&id);
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(task = %id, error = %e, "ingestion task aborted");
                lock(&self.statuses).insert(id, TaskStatus::Failed(format!("task aborted: {e}")));
            }
        }
        self.status(id)
    }

    /// Drop a finished task's entry and return its final status. Tasks still
    /// pending or running are kept and `None` is returned.
    pub fn forget(&self, id: TaskId) -> Option<TaskStatus> {
        let mut statuses = lock(&self.statuses);
        if !statuses.get(&id).is_some_and(TaskStatus::is_finished) {
            return None;
        }
        lock(&self.handles).remove(&id);
        statuses.remove(&id)
    }
}

/// Poisoning is ignored: every write replaces a whole entry.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use clausia_core::RiskLevel;
    use tokio::sync::Notify;

    use super::*;
    use crate::http::ReportClause;

    struct FakeRunner {
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    #[async_trait]
    impl IngestionRunner for FakeRunner {
        async fn run(&self, job: &IngestionJob) -> Result<IngestionReport, BackendError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(BackendError::Server {
                    status: 403,
                    detail: format!("{} is not a PDF", job.file_name),
                });
            }
            Ok(IngestionReport {
                risk_score: Some(50.0),
                classified_clauses: vec![ReportClause {
                    clause_type: Some("Payment".into()),
                    original_text: Some("Net 30".into()),
                    ai_summary: None,
                }],
                ..Default::default()
            })
        }
    }

    fn job() -> IngestionJob {
        IngestionJob {
            file_name: "MSA.pdf".into(),
            bytes: b"%PDF-1.7".to_vec(),
            tenant_id: "t1".into(),
            matter_id: "m1".into(),
            contract_id: "d1".into(),
        }
    }

    #[tokio::test]
    async fn status_moves_from_pending_to_succeeded() {
        let gate = Arc::new(Notify::new());
        let queue = IngestionQueue::new(FakeRunner { gate: Some(Arc::clone(&gate)), fail: false });
        let id = queue.submit(job());
        assert_eq!(queue.status(id), Some(TaskStatus::Pending));

        while queue.status(id) != Some(TaskStatus::Running) {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        match queue.wait(id).await {
            Some(TaskStatus::Succeeded(extraction)) => {
                assert_eq!(extraction.risk_level, Some(RiskLevel::Medium));
                assert_eq!(extraction.clauses.len(), 1);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_is_recorded_not_raised() {
        let queue = IngestionQueue::new(FakeRunner { gate: None, fail: true });
        let id = queue.submit(job());
        let status = queue.wait(id).await.unwrap();
        assert_eq!(status, TaskStatus::Failed("backend returned 403: MSA.pdf is not a PDF".into()));
        assert!(status.is_finished());
        // A second wait just reports the stored outcome.
        assert_eq!(queue.wait(id).await, Some(status));
    }

    #[tokio::test]
    async fn unknown_task_has_no_status() {
        let queue = IngestionQueue::new(FakeRunner { gate: None, fail: false });
        let first = queue.submit(job());
        let second = queue.submit(job());
        assert_ne!(first, second);
        assert_eq!(queue.status(TaskId(999)), None);
        assert_eq!(queue.wait(TaskId(999)).await, None);
    }

    #[tokio::test]
    async fn forget_drops_only_finished_tasks() {
        let gate = Arc::new(Notify::new());
        let queue = IngestionQueue::new(FakeRunner { gate: Some(Arc::clone(&gate)), fail: false });
        let id = queue.submit(job());
        assert_eq!(queue.forget(id), None);
        assert_eq!(queue.status(id), Some(TaskStatus::Pending));

        gate.notify_one();
        queue.wait(id).await;
        assert!(matches!(queue.forget(id), Some(TaskStatus::Succeeded(_))));
        assert_eq!(queue.status(id), None);
        assert_eq!(queue.forget(id), None);
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_value(TaskStatus::Failed("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "detail": "boom"}));
        let json = serde_json::to_value(TaskStatus::Pending).unwrap();
        assert_eq!(json, serde_json::json!({"status": "pending"}));
    }
}
