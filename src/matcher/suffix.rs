//! Suffix validation and matching.

use std::fmt;
use std::str::FromStr;

use crate::crypto::MAX_ENCODED_LEN;

/// The Bitcoin/Solana Base58 alphabet (no `0`, `O`, `I`, `l`).
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Errors produced when validating a requested suffix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuffixError {
    #[error("No suffix requested")]
    Empty,

    #[error("Invalid character {ch:?} at position {position} (Base58 excludes 0, O, I and l)")]
    InvalidCharacter { ch: char, position: usize },

    #[error("Suffix is {len} characters, longer than any Base58 public key ({max})")]
    TooLong { len: usize, max: usize },
}

/// How a found key satisfied the suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The encoding ends with the suffix exactly
    Exact,
    /// Only the lowercased encoding ends with the lowercased suffix
    CaseInsensitive,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::CaseInsensitive => write!(f, "case-insensitive"),
        }
    }
}

#[inline]
fn is_base58(c: char) -> bool {
    matches!(c, '1'..='9' | 'A'..='H' | 'J'..='N' | 'P'..='Z' | 'a'..='k' | 'm'..='z')
}

/// A validated, non-empty Base58 suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suffix {
    exact: String,
    lower: String,
    case_insensitive: bool,
}

impl Suffix {
    /// Validates a requested suffix.
    ///
    /// An empty string yields [`SuffixError::Empty`], which callers treat as
    /// "no constraint" rather than a misconfiguration.
    pub fn parse(suffix: &str) -> Result<Self, SuffixError> {
        if suffix.is_empty() {
            return Err(SuffixError::Empty);
        }

        if let Some((position, ch)) = suffix.chars().enumerate().find(|(_, c)| !is_base58(*c)) {
            return Err(SuffixError::InvalidCharacter { ch, position });
        }

        // All characters are ASCII past this point, so len() counts chars.
        if suffix.len() > MAX_ENCODED_LEN {
            return Err(SuffixError::TooLong {
                len: suffix.len(),
                max: MAX_ENCODED_LEN,
            });
        }

        let lower = suffix.to_ascii_lowercase();
        let case_insensitive = lower != suffix;

        Ok(Self {
            exact: suffix.to_owned(),
            lower,
            case_insensitive,
        })
    }

    /// Returns the suffix as requested.
    pub fn as_str(&self) -> &str {
        &self.exact
    }

    /// Returns the lowercased suffix.
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Whether the lowercased form differs from the original.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Number of characters in the suffix.
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Matches an encoded public key against this suffix.
    ///
    /// The exact comparison always runs first. The case-insensitive one only
    /// runs when `allow_case_insensitive` is set and the suffix has letters
    /// whose case can differ.
    #[inline]
    pub fn matches(&self, encoded: &str, allow_case_insensitive: bool) -> Option<MatchKind> {
        if encoded.ends_with(&self.exact) {
            return Some(MatchKind::Exact);
        }

        if allow_case_insensitive && self.case_insensitive {
            let encoded = encoded.as_bytes();
            let n = self.lower.len();
            if encoded.len() >= n
                && encoded[encoded.len() - n..].eq_ignore_ascii_case(self.lower.as_bytes())
            {
                return Some(MatchKind::CaseInsensitive);
            }
        }

        None
    }

    /// Returns the estimated number of attempts for an exact match.
    ///
    /// Each Base58 character has 58 possible values, so expected attempts
    /// are 58^n. The last character of a 32-byte encoding is not perfectly
    /// uniform, which this ignores.
    pub fn estimated_difficulty(&self) -> u64 {
        58u64.saturating_pow(self.len() as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=10_000 => "Very Easy (< 1 second)".into(),
            10_001..=1_000_000 => "Easy (seconds)".into(),
            1_000_001..=100_000_000 => "Medium (minutes)".into(),
            100_000_001..=10_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl FromStr for Suffix {
    type Err = SuffixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.exact)
    }
}
