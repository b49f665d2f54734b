//! Unconstrained keypair generation when a vanity search cannot deliver.

use std::fmt;

use tracing::{debug, warn};

use crate::crypto::Keypair;

/// Why a random keypair was returned instead of a vanity one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The caller asked for no suffix at all
    NoSuffixRequested,
    /// The suffix contained characters outside the Base58 alphabet
    InvalidSuffix,
    /// Every worker used its budget without a match
    BudgetExhausted,
    /// The pool and the single-worker retry both failed
    WorkerFailure,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoSuffixRequested => write!(f, "no suffix requested"),
            FallbackReason::InvalidSuffix => write!(f, "invalid suffix"),
            FallbackReason::BudgetExhausted => write!(f, "budget exhausted"),
            FallbackReason::WorkerFailure => write!(f, "worker failure"),
        }
    }
}

/// Produces a random keypair; never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackPolicy;

impl FallbackPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Returns a freshly generated keypair, logging `reason`.
    ///
    /// A missing suffix is the common case and logs at debug level; every
    /// other reason is a warning.
    pub fn fallback(&self, reason: FallbackReason) -> Keypair {
        let keypair = Keypair::generate();

        match reason {
            FallbackReason::NoSuffixRequested => {
                debug!(pubkey = %keypair.pubkey(), "no vanity suffix, using random keypair");
            }
            _ => {
                warn!(
                    %reason,
                    pubkey = %keypair.pubkey(),
                    "vanity search did not produce a match, using random keypair"
                );
            }
        }

        keypair
    }
}
