use crate::error::{AtlasError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackPhase {
    Trimming,
    Deduplicating,
    Sizing,
    Packing,
    Compositing,
}

/// Structured progress notifications. Consumed by a reporting collaborator
/// (CLI progress bars, GUI counters); the core never prints.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    RunStarted {
        sprites: usize,
    },
    PhaseStarted {
        phase: PackPhase,
    },
    SpriteProcessed {
        key: String,
        done: usize,
        total: usize,
    },
    RunFinished {
        elapsed: Duration,
        width: u32,
        height: u32,
        occupancy: f64,
    },
    /// Batch-level: a job was picked up by a worker.
    JobStarted {
        name: String,
    },
    /// Batch-level: a job completed (successfully or not).
    JobFinished {
        name: String,
        elapsed: Duration,
        ok: bool,
    },
}

/// Receives progress events. Implementations must be cheap and non-blocking;
/// events are emitted from worker threads.
pub trait ProgressSink: Send + Sync {
    fn event(&self, ev: ProgressEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn event(&self, _ev: ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn event(&self, ev: ProgressEvent) {
        self(ev)
    }
}

/// Shared state for one run or batch: cooperative cancellation flag and the
/// progress sink. Cancellation is checked between pipeline stages and
/// between batch jobs, never inside a packing algorithm.
#[derive(Clone)]
pub struct RunContext {
    cancel: Arc<AtomicBool>,
    progress: Arc<dyn ProgressSink>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(NullSink),
        }
    }

    pub fn with_progress(progress: Arc<dyn ProgressSink>) -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            progress,
        }
    }

    /// Handle that cancels this context from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Fails with `Cancelled` once the flag is set.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AtlasError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn emit(&self, ev: ProgressEvent) {
        self.progress.event(ev);
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
