//! In-process job registry and progress channel
//!
//! Tracks asynchronous generation jobs by id, records an ordered progress
//! log, and fans progress events out to any number of subscribers. Fan-out
//! is a per-job `tokio::sync::broadcast` channel (one producer, many
//! consumer handles); a subscriber that attaches late receives the full
//! history snapshot first, captured under the same lock that guards live
//! emission, so no event is missed or duplicated.
//!
//! The registry sits behind the [`JobStore`] trait so a durable backing
//! (key-value store, queue) can be substituted without touching
//! orchestration. The in-memory store keeps jobs for the lifetime of the
//! process; job history is lost on restart.

use crate::events::{JobStatus, ProgressEvent};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per job channel before slow subscribers start lagging
const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Point-in-time view of a job
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    pub progress: Vec<ProgressEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// History replay plus a live receiver, handed to new subscribers.
///
/// Dropping the receiver is the unsubscribe: delivery to that subscriber
/// stops, the job itself keeps running.
pub struct Subscription {
    pub history: Vec<ProgressEvent>,
    pub live: broadcast::Receiver<ProgressEvent>,
}

/// Outcome of a start request
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A new job was registered and its work spawned
    Started(JobSnapshot),
    /// A job with this id is already running; no new work was spawned
    AlreadyRunning(JobSnapshot),
}

impl StartOutcome {
    pub fn snapshot(&self) -> &JobSnapshot {
        match self {
            StartOutcome::Started(s) | StartOutcome::AlreadyRunning(s) => s,
        }
    }

    pub fn already_running(&self) -> bool {
        matches!(self, StartOutcome::AlreadyRunning(_))
    }
}

/// Storage abstraction for job state and progress fan-out.
///
/// `put_running`/`get`/`subscribe` are the substitution seam for a durable
/// backing; `emit`/`complete`/`fail` are the single mutation path used by
/// running work.
pub trait JobStore: Send + Sync {
    /// Register a fresh `running` job under `job_id`. Returns `false`
    /// without touching anything if a job with this id is still running;
    /// a finished (done/error) job is replaced.
    fn put_running(&self, job_id: &str) -> bool;

    fn get(&self, job_id: &str) -> Option<JobSnapshot>;

    /// Append `event` to the job's log and notify current subscribers
    fn emit(&self, job_id: &str, event: ProgressEvent);

    /// Transition `running → done` with a result value
    fn complete(&self, job_id: &str, result: serde_json::Value);

    /// Transition `running → error` and emit the terminal error event
    fn fail(&self, job_id: &str, error: String);

    /// Replay-then-attach subscription; `None` for unknown job ids
    fn subscribe(&self, job_id: &str) -> Option<Subscription>;
}

struct JobState {
    status: JobStatus,
    progress: Vec<ProgressEvent>,
    result: Option<serde_json::Value>,
    error: Option<String>,
    tx: broadcast::Sender<ProgressEvent>,
}

impl JobState {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            status: JobStatus::Running,
            progress: Vec::new(),
            result: None,
            error: None,
            tx,
        }
    }

    fn snapshot(&self, id: &str) -> JobSnapshot {
        JobSnapshot {
            id: id.to_string(),
            status: self.status,
            progress: self.progress.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Process-lifetime job store backed by a mutex-guarded map.
///
/// Lock order is always map → job; no lock is held across an await.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, Arc<Mutex<JobState>>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn job(&self, job_id: &str) -> Option<Arc<Mutex<JobState>>> {
        self.jobs
            .lock()
            .expect("job map lock poisoned")
            .get(job_id)
            .cloned()
    }
}

impl JobStore for InMemoryJobStore {
    fn put_running(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.lock().expect("job map lock poisoned");
        if let Some(existing) = jobs.get(job_id) {
            let state = existing.lock().expect("job state lock poisoned");
            if state.status == JobStatus::Running {
                return false;
            }
        }
        jobs.insert(job_id.to_string(), Arc::new(Mutex::new(JobState::new())));
        true
    }

    fn get(&self, job_id: &str) -> Option<JobSnapshot> {
        let job = self.job(job_id)?;
        let state = job.lock().expect("job state lock poisoned");
        Some(state.snapshot(job_id))
    }

    fn emit(&self, job_id: &str, event: ProgressEvent) {
        let Some(job) = self.job(job_id) else {
            debug!(job_id = %job_id, "Progress event for unknown job dropped");
            return;
        };
        let mut state = job.lock().expect("job state lock poisoned");
        state.progress.push(event.clone());
        // send() under the job lock keeps replay and live delivery ordered
        match state.tx.send(event) {
            Ok(receivers) => {
                debug!(job_id = %job_id, receivers = receivers, "Progress event broadcast");
            }
            Err(_) => {
                debug!(job_id = %job_id, "No subscribers for progress event");
            }
        }
    }

    fn complete(&self, job_id: &str, result: serde_json::Value) {
        if let Some(job) = self.job(job_id) {
            let mut state = job.lock().expect("job state lock poisoned");
            state.status = JobStatus::Done;
            state.result = Some(result);
        }
    }

    fn fail(&self, job_id: &str, error: String) {
        let Some(job) = self.job(job_id) else {
            return;
        };
        let event = ProgressEvent::error(error.clone());
        let mut state = job.lock().expect("job state lock poisoned");
        state.status = JobStatus::Error;
        state.error = Some(error);
        state.progress.push(event.clone());
        let _ = state.tx.send(event);
    }

    fn subscribe(&self, job_id: &str) -> Option<Subscription> {
        let job = self.job(job_id)?;
        let state = job.lock().expect("job state lock poisoned");
        // History snapshot and receiver creation under one lock: events
        // emitted after this point arrive only on the live channel.
        Some(Subscription {
            history: state.progress.clone(),
            live: state.tx.subscribe(),
        })
    }
}

/// Emit handle passed to running job work
#[derive(Clone)]
pub struct ProgressEmitter {
    store: Arc<dyn JobStore>,
    job_id: String,
}

impl ProgressEmitter {
    pub fn emit(&self, event: ProgressEvent) {
        self.store.emit(&self.job_id, event);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

/// Job registry: at-most-one running job per id, progress streaming,
/// terminal error events on failure. Jobs are never deleted.
#[derive(Clone)]
pub struct JobRegistry {
    store: Arc<dyn JobStore>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryJobStore::new()))
    }

    pub fn with_store(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Start `work` under `job_id` unless a job with that id is already
    /// running, in which case the existing job is returned unchanged and
    /// no work is spawned.
    ///
    /// The work runs to completion on the tokio runtime regardless of
    /// subscribers; success stores its result value, failure stores the
    /// error message and emits the terminal error event.
    pub fn start<F, Fut>(&self, job_id: &str, work: F) -> StartOutcome
    where
        F: FnOnce(ProgressEmitter) -> Fut,
        Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        if !self.store.put_running(job_id) {
            let snapshot = self
                .store
                .get(job_id)
                .unwrap_or_else(|| JobSnapshot {
                    id: job_id.to_string(),
                    status: JobStatus::Running,
                    progress: Vec::new(),
                    result: None,
                    error: None,
                });
            debug!(job_id = %job_id, "Job already running, returning existing job");
            return StartOutcome::AlreadyRunning(snapshot);
        }

        let emitter = ProgressEmitter {
            store: Arc::clone(&self.store),
            job_id: job_id.to_string(),
        };
        let store = Arc::clone(&self.store);
        let id = job_id.to_string();
        let fut = work(emitter);

        tokio::spawn(async move {
            match fut.await {
                Ok(result) => {
                    tracing::info!(job_id = %id, "Job completed");
                    store.complete(&id, result);
                }
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "Job failed");
                    store.fail(&id, e.to_string());
                }
            }
        });

        let snapshot = self.store.get(job_id).unwrap_or_else(|| JobSnapshot {
            id: job_id.to_string(),
            status: JobStatus::Running,
            progress: Vec::new(),
            result: None,
            error: None,
        });
        StartOutcome::Started(snapshot)
    }

    pub fn get(&self, job_id: &str) -> Option<JobSnapshot> {
        self.store.get(job_id)
    }

    pub fn subscribe(&self, job_id: &str) -> Option<Subscription> {
        self.store.subscribe(job_id)
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PipelineStep;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_twice_returns_existing_job() {
        let registry = JobRegistry::new();
        let executions = Arc::new(AtomicUsize::new(0));

        let exec = Arc::clone(&executions);
        let first = registry.start("matrix-v1", move |_emit| async move {
            exec.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(serde_json::json!({"rows": 1}))
        });
        assert!(!first.already_running());

        let exec = Arc::clone(&executions);
        let second = registry.start("matrix-v1", move |_emit| async move {
            exec.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::Value::Null)
        });
        assert!(second.already_running());
        assert_eq!(second.snapshot().id, "matrix-v1");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert_eq!(registry.get("matrix-v1").unwrap().status, JobStatus::Done);
    }

    #[tokio::test]
    async fn test_restart_allowed_after_completion() {
        let registry = JobRegistry::new();

        registry.start("job", |_emit| async { Ok(serde_json::Value::Null) });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.get("job").unwrap().status, JobStatus::Done);

        let outcome = registry.start("job", |_emit| async { Ok(serde_json::Value::Null) });
        assert!(!outcome.already_running());
    }

    #[tokio::test]
    async fn test_late_subscriber_receives_history_before_live_events() {
        let registry = JobRegistry::new();
        let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();

        registry.start("job", move |emit| async move {
            emit.emit(ProgressEvent::new(PipelineStep::Extracting, "first", 5));
            emit.emit(ProgressEvent::new(PipelineStep::Extracting, "second", 10));
            gate_rx.await.ok();
            emit.emit(ProgressEvent::new(PipelineStep::Done, "done", 100));
            Ok(serde_json::Value::Null)
        });

        // Let the first two events land
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut sub = registry.subscribe("job").expect("job exists");
        assert_eq!(sub.history.len(), 2);
        assert_eq!(sub.history[0].message, "first");
        assert_eq!(sub.history[1].message, "second");

        gate_tx.send(()).unwrap();
        let live = sub.live.recv().await.unwrap();
        assert_eq!(live.step, PipelineStep::Done);
        assert_eq!(live.progress, 100);
    }

    #[tokio::test]
    async fn test_failure_emits_terminal_error_event() {
        let registry = JobRegistry::new();

        registry.start("job", |emit| async move {
            emit.emit(ProgressEvent::new(PipelineStep::Classifying, "working", 55));
            anyhow::bail!("generation failed after 3 attempts")
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = registry.get("job").unwrap();
        assert_eq!(snapshot.status, JobStatus::Error);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("generation failed after 3 attempts")
        );

        let last = snapshot.progress.last().unwrap();
        assert_eq!(last.step, PipelineStep::Error);
        assert_eq!(last.progress, -1);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_job_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.subscribe("missing").is_none());
        assert!(registry.get("missing").is_none());
    }
}
