//! Suffix matching for Base58 public keys.
//!
//! Supports two match kinds:
//! - Exact: the encoding ends with the suffix as written
//! - CaseInsensitive: the lowercased encoding ends with the lowercased suffix

mod suffix;

pub use suffix::{MatchKind, Suffix, SuffixError, BASE58_ALPHABET};
