use crate::config::PackerConfig;
use crate::error::{AtlasError, Result};
use crate::pipeline::{InputSprite, PackOutput, pack_sprites_with};
use crate::progress::{ProgressEvent, RunContext};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One unit of batch work: a named sprite set packed into its own atlas.
pub struct BatchJob {
    pub name: String,
    pub sprites: Vec<InputSprite>,
}

/// Worker-pool knobs.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Worker thread count; 0 uses the available parallelism.
    pub workers: usize,
    /// Aggregate estimated bytes of in-flight jobs above which further
    /// dequeues block. 0 disables throttling. A job is always admitted when
    /// nothing else is in flight.
    pub memory_limit_bytes: u64,
    /// Stop dequeuing new jobs after the first failure. In-flight jobs still
    /// finish; undrained jobs are reported as cancelled.
    pub abort_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            memory_limit_bytes: 0,
            abort_on_error: false,
        }
    }
}

/// Per-job outcome, in submission order.
pub struct JobReport {
    pub name: String,
    pub elapsed: Duration,
    pub result: Result<PackOutput>,
}

pub struct BatchReport {
    pub jobs: Vec<JobReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.result.is_ok()).count()
    }
    pub fn failed(&self) -> usize {
        self.jobs.len() - self.succeeded()
    }
}

/// Memory-gated admission: dequeues block while the in-flight estimate is
/// above the limit.
struct MemoryGate {
    used: Mutex<u64>,
    freed: Condvar,
    limit: u64,
}

impl MemoryGate {
    fn new(limit: u64) -> Self {
        Self {
            used: Mutex::new(0),
            freed: Condvar::new(),
            limit,
        }
    }

    fn acquire(&self, bytes: u64) {
        if self.limit == 0 {
            return;
        }
        let mut used = self.used.lock().unwrap_or_else(|e| e.into_inner());
        while *used > 0 && *used + bytes > self.limit {
            used = self.freed.wait(used).unwrap_or_else(|e| e.into_inner());
        }
        *used += bytes;
    }

    fn release(&self, bytes: u64) {
        if self.limit == 0 {
            return;
        }
        let mut used = self.used.lock().unwrap_or_else(|e| e.into_inner());
        *used = used.saturating_sub(bytes);
        drop(used);
        self.freed.notify_all();
    }
}

fn job_bytes(job: &BatchJob) -> u64 {
    job.sprites
        .iter()
        .map(|s| {
            let w = s.image.width() as u64;
            let h = s.image.height() as u64;
            w * h * 4
        })
        .sum()
}

/// Process each job independently on a fixed pool of workers. One job's
/// failure never affects another; cancellation and `abort_on_error` take
/// effect between jobs, and a fully processed job is never rolled back.
pub fn run_batch(
    jobs: Vec<BatchJob>,
    cfg: &PackerConfig,
    opts: &BatchOptions,
    ctx: &RunContext,
) -> BatchReport {
    let start = Instant::now();
    let total = jobs.len();
    let workers = if opts.workers > 0 {
        opts.workers
    } else {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }
    .min(total.max(1));

    let queue: Mutex<VecDeque<(usize, BatchJob)>> = Mutex::new(jobs.into_iter().enumerate().collect());
    let slots: Mutex<Vec<Option<JobReport>>> =
        Mutex::new((0..total).map(|_| None).collect());
    let gate = MemoryGate::new(opts.memory_limit_bytes);
    let stop = AtomicBool::new(false);
    let processed = AtomicUsize::new(0);
    let failures = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    if stop.load(Ordering::Relaxed) || ctx.is_cancelled() {
                        break;
                    }
                    let Some((idx, job)) = pop_job(&queue) else {
                        break;
                    };
                    let bytes = job_bytes(&job);
                    gate.acquire(bytes);

                    ctx.emit(ProgressEvent::JobStarted {
                        name: job.name.clone(),
                    });
                    let job_start = Instant::now();
                    let result = pack_sprites_with(job.sprites, cfg.clone(), ctx);
                    let elapsed = job_start.elapsed();
                    gate.release(bytes);

                    let ok = result.is_ok();
                    if !ok {
                        failures.fetch_add(1, Ordering::Relaxed);
                        if opts.abort_on_error {
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                    processed.fetch_add(1, Ordering::Relaxed);
                    ctx.emit(ProgressEvent::JobFinished {
                        name: job.name.clone(),
                        elapsed,
                        ok,
                    });
                    debug!(job = %job.name, ok, ?elapsed, "batch job finished");

                    let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
                    slots[idx] = Some(JobReport {
                        name: job.name,
                        elapsed,
                        result,
                    });
                }
            });
        }
    });

    let slots = slots.into_inner().unwrap_or_else(|e| e.into_inner());
    let mut leftover = queue.into_inner().unwrap_or_else(|e| e.into_inner());
    let mut by_index: Vec<Option<JobReport>> = slots;
    while let Some((idx, job)) = leftover.pop_front() {
        by_index[idx] = Some(JobReport {
            name: job.name,
            elapsed: Duration::ZERO,
            result: Err(AtlasError::Cancelled),
        });
    }
    let jobs: Vec<JobReport> = by_index.into_iter().flatten().collect();
    info!(
        total,
        succeeded = jobs.iter().filter(|j| j.result.is_ok()).count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch finished"
    );
    BatchReport {
        jobs,
        elapsed: start.elapsed(),
    }
}

fn pop_job(queue: &Mutex<VecDeque<(usize, BatchJob)>>) -> Option<(usize, BatchJob)> {
    queue
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .pop_front()
}
