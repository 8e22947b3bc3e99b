mod types;

pub use types::*;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

/// Progress of one processing run.
///
/// Every mutation happens under one short-lived lock and publishes the new
/// snapshot. The lock is never held across a media tool call.
pub struct ProgressTracker {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    inner: Mutex<Progress>,
    event_tx: broadcast::Sender<AppEvent>,
}

impl ProgressTracker {
    /// Create a tracker publishing on an existing channel.
    pub fn new(event_tx: broadcast::Sender<AppEvent>) -> Self {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let progress = Progress {
            run_id: Some(run_id),
            started_at: Some(started_at),
            ..Progress::idle()
        };
        Self {
            run_id,
            started_at,
            inner: Mutex::new(progress),
            event_tx,
        }
    }

    /// Create a tracker with its own channel.
    pub fn standalone() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self::new(event_tx)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    pub fn snapshot(&self) -> Progress {
        self.inner.lock().clone()
    }

    /// Publish a run-scoped event.
    pub fn emit(&self, event: AppEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("No subscribers for run event");
        }
    }

    fn update(&self, f: impl FnOnce(&mut Progress)) {
        let snapshot = {
            let mut progress = self.inner.lock();
            f(&mut progress);
            progress.clone()
        };
        self.emit(AppEvent::Progress { progress: snapshot });
    }

    /// Enter `processing` with `total` episodes.
    pub fn begin_processing(&self, total: usize) {
        self.update(|p| {
            p.status = RunStatus::Processing;
            p.total = total;
            p.completed = 0;
            p.percent = 0.0;
            p.done = false;
        });
    }

    /// Enter `merging`. `completed` resets; `total` is kept until
    /// [`set_total`](Self::set_total) assigns the part count.
    pub fn begin_merging(&self) {
        self.update(|p| {
            p.status = RunStatus::Merging;
            p.completed = 0;
            p.percent = 0.0;
        });
    }

    pub fn set_total(&self, total: usize) {
        self.update(|p| {
            p.total = total;
            p.recompute();
        });
    }

    /// One episode or part finished.
    pub fn complete_unit(&self) {
        self.update(|p| {
            p.completed += 1;
            p.recompute();
        });
    }

    /// Record a fatal error. The run still has to be finished.
    pub fn fail(&self, error: impl Into<String>) {
        let error = error.into();
        self.update(|p| p.error = Some(error));
    }

    /// Enter `done`: percent 100 and completed equal to total.
    pub fn finish(&self) {
        self.update(|p| {
            p.status = RunStatus::Done;
            p.completed = p.total;
            p.percent = 100.0;
            p.done = true;
            p.finished_at = Some(Utc::now());
        });
    }
}

/// Server-wide state: the event channel and the most recent run.
pub struct AppState {
    current: RwLock<Option<Arc<ProgressTracker>>>,
    event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            current: RwLock::new(None),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the event sender for use in other components.
    pub fn event_sender(&self) -> broadcast::Sender<AppEvent> {
        self.event_tx.clone()
    }

    /// Create the tracker of a new run and make it the current one.
    pub fn start_run(&self, input: &Path, output: &Path) -> Arc<ProgressTracker> {
        let tracker = Arc::new(ProgressTracker::new(self.event_tx.clone()));
        *self.current.write() = Some(tracker.clone());
        tracker.emit(AppEvent::RunStarted {
            run_id: tracker.run_id(),
            input: PathBuf::from(input),
            output: PathBuf::from(output),
        });
        tracker
    }

    pub fn current_run(&self) -> Option<Arc<ProgressTracker>> {
        self.current.read().clone()
    }

    /// Progress of the current run, or an idle snapshot.
    pub fn status(&self) -> Progress {
        self.current_run()
            .map(|t| t.snapshot())
            .unwrap_or_else(Progress::idle)
    }
}
