//! Search coordination: worker selection, first-match-wins, fallback.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, error, info, trace, warn};

use crate::config::SearchConfig;
use crate::crypto::{GeneratorFactory, Keypair, RandomKeyGenerator};
use crate::fallback::{FallbackPolicy, FallbackReason};
use crate::matcher::{MatchKind, Suffix, SuffixError};

use super::cpu::{SearchWorker, WorkerEvent, WorkerProgress, WorkerResult};
use super::pool::{budget_per_worker, panic_message, PoolSettings, WorkerError, WorkerPool};

/// How long the coordinator waits on the event channel before re-checking
/// the stop flag, deadline and report timer.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of a search for a given suffix.
#[derive(Debug)]
pub enum SearchOutcome {
    /// A worker found a matching key
    Matched {
        keypair: Keypair,
        attempts: u64,
        elapsed: Duration,
        match_kind: MatchKind,
        workers: usize,
    },
    /// The budget ran out, the timeout elapsed, or the search was stopped
    Exhausted {
        attempts: u64,
        elapsed: Duration,
        workers: usize,
    },
    /// The suffix was rejected before any work started
    Invalid(SuffixError),
    /// The pool failed and so did the single-worker retry
    Failed {
        attempts: u64,
        elapsed: Duration,
        error: WorkerError,
    },
}

impl SearchOutcome {
    /// Returns true if a worker found a matching key.
    pub fn is_matched(&self) -> bool {
        matches!(self, SearchOutcome::Matched { .. })
    }

    /// Attempts consumed, zero for an invalid suffix.
    pub fn attempts(&self) -> u64 {
        match self {
            SearchOutcome::Matched { attempts, .. }
            | SearchOutcome::Exhausted { attempts, .. }
            | SearchOutcome::Failed { attempts, .. } => *attempts,
            SearchOutcome::Invalid(_) => 0,
        }
    }
}

/// Observability record attached to every returned keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDiagnostics {
    pub matched: bool,
    pub attempts: u64,
    pub elapsed: Duration,
    pub match_kind: Option<MatchKind>,
    pub workers: usize,
    pub fallback: Option<FallbackReason>,
}

impl SearchDiagnostics {
    /// Elapsed time in whole milliseconds.
    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Generation rate; for reporting only.
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.attempts as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// A keypair plus how it was obtained. Always produced, vanity or not.
#[derive(Debug)]
pub struct VanityKeypair {
    pub keypair: Keypair,
    pub diagnostics: SearchDiagnostics,
}

/// Runs vanity searches according to a [`SearchConfig`].
pub struct SearchCoordinator<F = fn(usize) -> RandomKeyGenerator> {
    config: SearchConfig,
    factory: F,
    fallback: FallbackPolicy,
    /// External cancellation, e.g. from a signal handler
    stop_flag: Arc<AtomicBool>,
}

impl SearchCoordinator {
    /// Creates a coordinator that draws keys from the OS-seeded CSPRNG.
    pub fn new(config: SearchConfig) -> Self {
        Self::with_factory(config, RandomKeyGenerator::for_worker)
    }
}

impl<F: GeneratorFactory> SearchCoordinator<F> {
    /// Creates a coordinator with a custom per-worker generator factory.
    pub fn with_factory(config: SearchConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            fallback: FallbackPolicy::new(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the settings this coordinator searches with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Returns a keypair for `suffix`, falling back to a random one whenever
    /// the vanity constraint cannot be met. Never fails.
    pub fn generate(&self, suffix: &str) -> VanityKeypair {
        let start = Instant::now();

        let suffix = match Suffix::parse(suffix) {
            Ok(suffix) => suffix,
            Err(SuffixError::Empty) => {
                return self.fall_back(FallbackReason::NoSuffixRequested, 0, 0, start);
            }
            Err(e) => {
                warn!(error = %e, "invalid vanity suffix");
                return self.fall_back(FallbackReason::InvalidSuffix, 0, 0, start);
            }
        };

        let outcome =
            self.search_suffix(&suffix, self.config.total_budget, self.config.max_workers);
        self.resolve(outcome, start)
    }

    /// Searches for a key ending in `suffix` within `total_budget` attempts
    /// using at most `max_workers` workers.
    pub fn search(&self, suffix: &str, total_budget: u64, max_workers: usize) -> SearchOutcome {
        match Suffix::parse(suffix) {
            Ok(suffix) => self.search_suffix(&suffix, total_budget, max_workers),
            Err(e) => SearchOutcome::Invalid(e),
        }
    }

    fn search_suffix(
        &self,
        suffix: &Suffix,
        total_budget: u64,
        max_workers: usize,
    ) -> SearchOutcome {
        let start = Instant::now();
        let workers = self.config.worker_count(max_workers);
        let single_budget = total_budget.min(self.config.single_thread_budget);

        if !self.config.enable_parallel
            || suffix.len() < self.config.min_parallel_len
            || workers == 1
        {
            info!(
                %suffix,
                budget = single_budget,
                difficulty = %suffix.difficulty_description(),
                "starting single-worker vanity search"
            );
            return self.search_single(suffix, single_budget, start, 0);
        }

        info!(
            %suffix,
            workers,
            budget = total_budget,
            difficulty = %suffix.difficulty_description(),
            "starting parallel vanity search"
        );

        match self.search_parallel(suffix, total_budget, workers, start) {
            Ok(outcome) => outcome,
            Err((e, attempts)) => {
                error!(
                    error = %e,
                    attempts,
                    "vanity worker pool failed, retrying on a single worker"
                );
                self.search_single(suffix, single_budget, start, attempts)
            }
        }
    }

    /// Runs one worker on the calling thread. `prior_attempts` carries
    /// attempts already spent by a failed pool. The timeout counts from
    /// `start`, so a retry only gets what the pool left over.
    fn search_single(
        &self,
        suffix: &Suffix,
        budget: u64,
        start: Instant,
        prior_attempts: u64,
    ) -> SearchOutcome {
        let progress = Arc::new(WorkerProgress::new());
        let deadline = self.deadline(start);

        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            SearchWorker::new(
                0,
                suffix.clone(),
                budget,
                self.factory.create(0),
                self.stop_flag.clone(),
                progress.clone(),
            )
            .allow_case_insensitive(self.config.allow_case_insensitive)
            .with_progress_interval(self.config.progress_interval)
            .with_deadline(deadline)
            .run()
        }));

        match run {
            Ok(WorkerResult::Found {
                keypair,
                attempts,
                match_kind,
            }) => SearchOutcome::Matched {
                keypair,
                attempts: prior_attempts + attempts,
                elapsed: start.elapsed(),
                match_kind,
                workers: 1,
            },
            Ok(WorkerResult::Completed { attempts }) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    warn!(attempts = prior_attempts + attempts, "vanity search timed out");
                }
                SearchOutcome::Exhausted {
                    attempts: prior_attempts + attempts,
                    elapsed: start.elapsed(),
                    workers: 1,
                }
            }
            Err(payload) => {
                let error = WorkerError::Panicked {
                    worker_id: 0,
                    message: panic_message(payload.as_ref()),
                };
                error!(error = %error, "single-worker vanity search failed");
                SearchOutcome::Failed {
                    attempts: prior_attempts + progress.attempts(),
                    elapsed: start.elapsed(),
                    error,
                }
            }
        }
    }

    /// Races `workers` pooled workers. The first `Found` event wins; every
    /// other worker is stopped and its results are discarded unread.
    ///
    /// On worker failure returns the error with the attempts spent so far.
    fn search_parallel(
        &self,
        suffix: &Suffix,
        total_budget: u64,
        workers: usize,
        start: Instant,
    ) -> Result<SearchOutcome, (WorkerError, u64)> {
        let deadline = self.deadline(start);
        let settings = PoolSettings {
            num_workers: workers,
            budget_per_worker: budget_per_worker(total_budget, workers),
            allow_case_insensitive: self.config.allow_case_insensitive,
            progress_interval: self.config.progress_interval,
            deadline,
        };

        let mut pool = WorkerPool::spawn(&self.factory, suffix, &settings).map_err(|e| (e, 0))?;

        let mut remaining = workers;
        let mut last_report = Instant::now();
        let mut winner = None;
        let mut failure = None;

        while remaining > 0 {
            if self.stop_flag.load(Ordering::Relaxed) {
                info!("vanity search stopped");
                break;
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(attempts = pool.total_attempts(), "vanity search timed out");
                    break;
                }
            }

            match pool.recv_timeout(POLL_INTERVAL) {
                Ok(WorkerEvent::Progress {
                    worker_id,
                    attempts,
                }) => {
                    trace!(worker = worker_id, attempts, "progress");
                }
                Ok(WorkerEvent::Finished {
                    worker_id,
                    result:
                        WorkerResult::Found {
                            keypair,
                            attempts,
                            match_kind,
                        },
                }) => {
                    pool.stop();
                    debug!(worker = worker_id, attempts, "worker won the race");
                    winner = Some((keypair, match_kind));
                    break;
                }
                Ok(WorkerEvent::Finished {
                    worker_id,
                    result: WorkerResult::Completed { attempts },
                }) => {
                    debug!(worker = worker_id, attempts, "worker exhausted its budget");
                    remaining -= 1;
                }
                Ok(WorkerEvent::Failed { error, .. }) => {
                    failure = Some(error);
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    failure = Some(WorkerError::Disconnected);
                    break;
                }
            }

            if last_report.elapsed() >= self.config.report_interval {
                info!(
                    attempts = pool.total_attempts(),
                    rate = pool.attempts_per_second() as u64,
                    elapsed_secs = pool.elapsed().as_secs(),
                    "vanity search progress"
                );
                last_report = Instant::now();
            }
        }

        let attempts = pool.shutdown();
        let elapsed = start.elapsed();

        if let Some(e) = failure {
            return Err((e, attempts));
        }

        Ok(match winner {
            Some((keypair, match_kind)) => SearchOutcome::Matched {
                keypair,
                attempts,
                elapsed,
                match_kind,
                workers,
            },
            None => SearchOutcome::Exhausted {
                attempts,
                elapsed,
                workers,
            },
        })
    }

    fn deadline(&self, start: Instant) -> Option<Instant> {
        self.config.timeout.map(|t| start + t)
    }

    /// Turns an outcome into a keypair, falling back where needed.
    fn resolve(&self, outcome: SearchOutcome, start: Instant) -> VanityKeypair {
        match outcome {
            SearchOutcome::Matched {
                keypair,
                attempts,
                elapsed,
                match_kind,
                workers,
            } => {
                let diagnostics = SearchDiagnostics {
                    matched: true,
                    attempts,
                    elapsed,
                    match_kind: Some(match_kind),
                    workers,
                    fallback: None,
                };
                info!(
                    pubkey = %keypair.pubkey(),
                    attempts,
                    elapsed_ms = diagnostics.elapsed_millis(),
                    rate = diagnostics.keys_per_second() as u64,
                    %match_kind,
                    "vanity keypair found"
                );
                VanityKeypair {
                    keypair,
                    diagnostics,
                }
            }
            SearchOutcome::Exhausted {
                attempts, workers, ..
            } => self.fall_back(FallbackReason::BudgetExhausted, attempts, workers, start),
            SearchOutcome::Invalid(e) => {
                warn!(error = %e, "invalid vanity suffix");
                self.fall_back(FallbackReason::InvalidSuffix, 0, 0, start)
            }
            SearchOutcome::Failed {
                attempts, error, ..
            } => {
                warn!(error = %error, "vanity search failed");
                self.fall_back(FallbackReason::WorkerFailure, attempts, 1, start)
            }
        }
    }

    fn fall_back(
        &self,
        reason: FallbackReason,
        attempts: u64,
        workers: usize,
        start: Instant,
    ) -> VanityKeypair {
        let keypair = self.fallback.fallback(reason);
        VanityKeypair {
            keypair,
            diagnostics: SearchDiagnostics {
                matched: false,
                attempts,
                elapsed: start.elapsed(),
                match_kind: None,
                workers,
                fallback: Some(reason),
            },
        }
    }
}
