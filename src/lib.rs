//! # sol_vanity
//!
//! Parallel search for Solana keypairs whose Base58 address ends with a
//! chosen suffix.
//!
//! ## Architecture
//!
//! - `crypto`: Ed25519 key generation and Base58 encoding
//! - `matcher`: Suffix validation and matching
//! - `worker`: Search workers, worker pool and coordinator
//! - `fallback`: Random keypair when no vanity key can be produced
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod fallback;
pub mod matcher;
pub mod worker;

pub use config::{Config, SearchConfig};
pub use crypto::{KeyGenerator, Keypair, Pubkey, RandomKeyGenerator};
pub use fallback::{FallbackPolicy, FallbackReason};
pub use matcher::{MatchKind, Suffix, SuffixError};
pub use worker::{SearchCoordinator, SearchDiagnostics, SearchOutcome, VanityKeypair, WorkerError};
