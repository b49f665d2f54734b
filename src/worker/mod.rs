//! Parallel vanity keypair search.
//!
//! This module provides:
//! - `SearchWorker`: a bounded generate-and-match loop
//! - `WorkerPool`: one OS thread per worker with a shared stop flag
//! - `SearchCoordinator`: budget split, first-match-wins and fallback

mod coordinator;
mod cpu;
mod pool;

pub use coordinator::{SearchCoordinator, SearchDiagnostics, SearchOutcome, VanityKeypair};
pub use cpu::{SearchWorker, WorkerEvent, WorkerProgress, WorkerResult, PROGRESS_INTERVAL};
pub use pool::{budget_per_worker, PoolSettings, WorkerError, WorkerPool};
