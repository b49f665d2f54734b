//! Runtime configuration for the vanity keypair search.

use std::time::Duration;

use clap::Parser;

use crate::worker::PROGRESS_INTERVAL;

/// Default total attempts for the parallel search.
pub const DEFAULT_TOTAL_BUDGET: u64 = 1_000_000;

/// Default attempts for the single-worker path.
pub const DEFAULT_SINGLE_THREAD_BUDGET: u64 = 300_000;

/// Upper bound on pool size regardless of host size.
pub const MAX_WORKERS: usize = 8;

/// Suffixes shorter than this are searched on a single worker.
pub const MIN_PARALLEL_SUFFIX_LEN: usize = 3;

/// Solana Vanity Keypair Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Suffix the Base58 public key should end with (empty = any key)
    #[arg(short, long, env = "VANITY_SUFFIX", default_value = "")]
    pub suffix: String,

    /// Total attempt budget for the parallel search
    #[arg(short = 'a', long, default_value_t = DEFAULT_TOTAL_BUDGET)]
    pub max_attempts: u64,

    /// Attempt budget for the single-worker path
    #[arg(long, default_value_t = DEFAULT_SINGLE_THREAD_BUDGET)]
    pub single_attempts: u64,

    /// Number of worker threads (default: number of CPU cores, at most 8)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Always search on a single worker
    #[arg(long, env = "VANITY_NO_PARALLEL")]
    pub no_parallel: bool,

    /// Only accept keys that match the suffix's exact case
    #[arg(short = 'c', long, default_value = "false")]
    pub case_sensitive: bool,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Give up after this many seconds even if attempts remain
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,
}

impl Config {
    /// Validates the configuration.
    ///
    /// The suffix is not checked here: an invalid suffix falls back to a
    /// random keypair instead of failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers(
                "Worker count must be at least 1".into(),
            ));
        }

        if self.report_interval == 0 {
            return Err(ConfigError::InvalidInterval(
                "Report interval must be at least 1 second".into(),
            ));
        }

        if self.timeout == Some(0) {
            return Err(ConfigError::InvalidInterval(
                "Timeout must be at least 1 second".into(),
            ));
        }

        Ok(())
    }

    /// Builds the explicit search configuration handed to the coordinator.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            total_budget: self.max_attempts,
            single_thread_budget: self.single_attempts,
            workers: self.workers,
            enable_parallel: !self.no_parallel,
            allow_case_insensitive: !self.case_sensitive,
            report_interval: Duration::from_secs(self.report_interval),
            timeout: self.timeout.map(Duration::from_secs),
            ..SearchConfig::default()
        }
    }
}

/// Settings for one [`crate::SearchCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Total attempts across the parallel pool
    pub total_budget: u64,
    /// Attempt ceiling for the single-worker path and failure retries
    pub single_thread_budget: u64,
    /// Requested worker count; `None` uses the number of CPUs
    pub workers: Option<usize>,
    /// Hard cap on the worker count
    pub max_workers: usize,
    /// When false, always use the single-worker path
    pub enable_parallel: bool,
    /// Suffixes shorter than this skip the pool
    pub min_parallel_len: usize,
    /// Accept keys whose lowercase encoding matches the lowercase suffix
    pub allow_case_insensitive: bool,
    /// Attempts between worker progress updates
    pub progress_interval: u64,
    /// How often the coordinator logs throughput
    pub report_interval: Duration,
    /// Optional wall-clock limit, counted from the start of the search and
    /// shared by the pool, the single-worker path and the retry
    pub timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            total_budget: DEFAULT_TOTAL_BUDGET,
            single_thread_budget: DEFAULT_SINGLE_THREAD_BUDGET,
            workers: None,
            max_workers: MAX_WORKERS,
            enable_parallel: true,
            min_parallel_len: MIN_PARALLEL_SUFFIX_LEN,
            allow_case_insensitive: true,
            progress_interval: PROGRESS_INTERVAL,
            report_interval: Duration::from_secs(5),
            timeout: None,
        }
    }
}

impl SearchConfig {
    /// Resolves the worker count: requested (or CPU count), capped by
    /// `max_workers`, the global cap, and never below 1.
    pub fn worker_count(&self, max_workers: usize) -> usize {
        self.workers
            .unwrap_or_else(num_cpus::get)
            .min(max_workers)
            .min(self.max_workers)
            .min(MAX_WORKERS)
            .max(1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}
