//! CPU worker for the vanity keypair search.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::{debug, trace};

use crate::crypto::{KeyGenerator, Keypair};
use crate::matcher::{MatchKind, Suffix};

use super::WorkerError;

/// Attempts between progress updates.
pub const PROGRESS_INTERVAL: u64 = 5_000;

/// Attempt counter for a single worker.
///
/// Only the owning worker writes it; the coordinator reads it for
/// throughput reporting.
#[derive(Debug, Default)]
pub struct WorkerProgress {
    attempts: AtomicU64,
}

impl WorkerProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attempts recorded so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    #[inline]
    fn record(&self, attempts: u64) {
        self.attempts.store(attempts, Ordering::Relaxed);
    }
}

/// What a worker produced when its loop ended.
#[derive(Debug)]
pub enum WorkerResult {
    /// A key satisfying the suffix
    Found {
        keypair: Keypair,
        attempts: u64,
        match_kind: MatchKind,
    },
    /// Budget used up, deadline passed, or the stop flag was raised
    Completed { attempts: u64 },
}

impl WorkerResult {
    /// Returns the attempts the worker consumed.
    pub fn attempts(&self) -> u64 {
        match self {
            WorkerResult::Found { attempts, .. } | WorkerResult::Completed { attempts } => {
                *attempts
            }
        }
    }
}

/// Messages a pooled worker sends to its coordinator.
#[derive(Debug)]
pub enum WorkerEvent {
    Progress { worker_id: usize, attempts: u64 },
    Finished { worker_id: usize, result: WorkerResult },
    Failed { worker_id: usize, error: WorkerError },
}

/// A worker that generates keypairs and tests them against a suffix.
pub struct SearchWorker<G> {
    id: usize,
    suffix: Suffix,
    allow_case_insensitive: bool,
    budget: u64,
    generator: G,
    stop_flag: Arc<AtomicBool>,
    progress: Arc<WorkerProgress>,
    progress_interval: u64,
    deadline: Option<Instant>,
    events: Option<Sender<WorkerEvent>>,
}

impl<G: KeyGenerator> SearchWorker<G> {
    /// Creates a new worker with the default progress cadence.
    pub fn new(
        id: usize,
        suffix: Suffix,
        budget: u64,
        generator: G,
        stop_flag: Arc<AtomicBool>,
        progress: Arc<WorkerProgress>,
    ) -> Self {
        Self {
            id,
            suffix,
            allow_case_insensitive: true,
            budget,
            generator,
            stop_flag,
            progress,
            progress_interval: PROGRESS_INTERVAL,
            deadline: None,
            events: None,
        }
    }

    /// Enables or disables case-insensitive matches.
    pub fn allow_case_insensitive(mut self, allow: bool) -> Self {
        self.allow_case_insensitive = allow;
        self
    }

    /// Sets how many attempts pass between progress updates.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Stops the loop once `deadline` has passed, whatever budget remains.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Attaches a channel that receives progress updates.
    pub fn with_events(mut self, events: Sender<WorkerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Runs the worker loop.
    ///
    /// Generates keypairs and tests them against the suffix until:
    /// - A match is found (returns `Found` at once)
    /// - The attempt budget is used up
    /// - The stop flag is set or the deadline passes
    ///
    /// Non-matching keypairs are dropped before the next iteration.
    pub fn run(&mut self) -> WorkerResult {
        let mut attempts = 0u64;

        while attempts < self.budget {
            if self.stop_flag.load(Ordering::Relaxed) {
                debug!(worker = self.id, attempts, "worker stopped");
                break;
            }

            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    debug!(worker = self.id, attempts, "worker reached deadline");
                    break;
                }
            }

            attempts += 1;
            let keypair = self.generator.generate();
            let encoded = keypair.pubkey().to_base58();

            if let Some(match_kind) = self.suffix.matches(&encoded, self.allow_case_insensitive) {
                self.progress.record(attempts);
                debug!(
                    worker = self.id,
                    attempts,
                    %match_kind,
                    pubkey = %encoded,
                    "worker found match"
                );
                return WorkerResult::Found {
                    keypair,
                    attempts,
                    match_kind,
                };
            }

            if attempts % self.progress_interval == 0 {
                self.report(attempts);
            }
        }

        self.progress.record(attempts);
        WorkerResult::Completed { attempts }
    }

    fn report(&self, attempts: u64) {
        self.progress.record(attempts);
        trace!(worker = self.id, attempts, "worker progress");

        if let Some(events) = &self.events {
            // Advisory only; a full channel just drops the update
            let _ = events.try_send(WorkerEvent::Progress {
                worker_id: self.id,
                attempts,
            });
        }
    }
}
