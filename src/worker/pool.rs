//! Worker pool management.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use tracing::{debug, warn};

use crate::crypto::GeneratorFactory;
use crate::matcher::Suffix;

use super::cpu::{SearchWorker, WorkerEvent, WorkerProgress};

/// Errors that take a worker out of the search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkerError {
    #[error("Failed to spawn worker {worker_id}: {message}")]
    Spawn { worker_id: usize, message: String },

    #[error("Worker {worker_id} panicked: {message}")]
    Panicked { worker_id: usize, message: String },

    #[error("Worker channel closed before all workers reported")]
    Disconnected,
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Settings shared by every worker in a pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub num_workers: usize,
    pub budget_per_worker: u64,
    pub allow_case_insensitive: bool,
    pub progress_interval: u64,
    /// Workers stop on their own once this passes
    pub deadline: Option<Instant>,
}

/// A running set of search workers, one OS thread each.
///
/// Dropping the pool stops and joins every worker.
pub struct WorkerPool {
    /// Number of workers
    num_workers: usize,
    /// Worker thread handles (Option to allow taking during shutdown)
    handles: Option<Vec<JoinHandle<()>>>,
    /// Event receiver; dropped before joining so blocked senders wake up
    event_rx: Option<Receiver<WorkerEvent>>,
    /// Pool-local stop flag
    stop_flag: Arc<AtomicBool>,
    /// Per-worker attempt counters
    progress: Vec<Arc<WorkerProgress>>,
    /// Start time
    start_time: Instant,
}

impl WorkerPool {
    /// Spawns `settings.num_workers` workers searching for `suffix`.
    ///
    /// If any thread fails to spawn, the workers already started are stopped
    /// and joined before the error is returned.
    pub fn spawn<F: GeneratorFactory>(
        factory: &F,
        suffix: &Suffix,
        settings: &PoolSettings,
    ) -> Result<Self, WorkerError> {
        let (event_tx, event_rx) = bounded(100);
        let stop_flag = Arc::new(AtomicBool::new(false));

        let mut pool = Self {
            num_workers: settings.num_workers,
            handles: Some(Vec::with_capacity(settings.num_workers)),
            event_rx: Some(event_rx),
            stop_flag: stop_flag.clone(),
            progress: Vec::with_capacity(settings.num_workers),
            start_time: Instant::now(),
        };

        for id in 0..settings.num_workers {
            let progress = Arc::new(WorkerProgress::new());
            let worker = SearchWorker::new(
                id,
                suffix.clone(),
                settings.budget_per_worker,
                factory.create(id),
                stop_flag.clone(),
                progress.clone(),
            )
            .allow_case_insensitive(settings.allow_case_insensitive)
            .with_progress_interval(settings.progress_interval)
            .with_deadline(settings.deadline)
            .with_events(event_tx.clone());

            let result_tx = event_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || {
                    let mut worker = worker;
                    let event = match panic::catch_unwind(AssertUnwindSafe(|| worker.run())) {
                        Ok(result) => WorkerEvent::Finished {
                            worker_id: id,
                            result,
                        },
                        Err(payload) => WorkerEvent::Failed {
                            worker_id: id,
                            error: WorkerError::Panicked {
                                worker_id: id,
                                message: panic_message(payload.as_ref()),
                            },
                        },
                    };
                    // Fails only once the coordinator has stopped listening
                    let _ = result_tx.send(event);
                });

            match spawned {
                Ok(handle) => {
                    pool.progress.push(progress);
                    if let Some(handles) = pool.handles.as_mut() {
                        handles.push(handle);
                    }
                }
                Err(e) => {
                    pool.shutdown();
                    return Err(WorkerError::Spawn {
                        worker_id: id,
                        message: e.to_string(),
                    });
                }
            }
        }

        // Drop our sender so the channel disconnects when all workers exit
        drop(event_tx);

        debug!(
            workers = settings.num_workers,
            budget_per_worker = settings.budget_per_worker,
            "worker pool started"
        );

        Ok(pool)
    }

    /// Waits for the next worker event, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<WorkerEvent, RecvTimeoutError> {
        match &self.event_rx {
            Some(rx) => rx.recv_timeout(timeout),
            None => Err(RecvTimeoutError::Disconnected),
        }
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops the workers, discards pending events, joins every thread and
    /// returns the total attempts made.
    pub fn shutdown(&mut self) -> u64 {
        self.stop();
        // Anything still queued (including late matches) is dropped unread
        self.event_rx.take();

        if let Some(handles) = self.handles.take() {
            for handle in handles {
                if handle.join().is_err() {
                    warn!("worker thread exited abnormally");
                }
            }
        }

        self.total_attempts()
    }

    /// Returns the number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the attempts made across all workers so far.
    pub fn total_attempts(&self) -> u64 {
        self.progress.iter().map(|p| p.attempts()).sum()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current generation rate (keys per second).
    pub fn attempts_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Splits a total budget across workers, rounding up.
pub fn budget_per_worker(total_budget: u64, num_workers: usize) -> u64 {
    if num_workers == 0 {
        return total_budget;
    }
    total_budget.div_ceil(num_workers as u64)
}
