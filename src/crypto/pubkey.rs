//! Solana public key representation and Base58 encoding.

use std::fmt;

/// Length of an Ed25519 public key in bytes.
pub const PUBKEY_LEN: usize = 32;

/// Longest possible Base58 encoding of a 32-byte key.
pub const MAX_ENCODED_LEN: usize = 44;

/// An Ed25519 public key (32 bytes), displayed as a Solana address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey([u8; PUBKEY_LEN]);

impl Pubkey {
    /// Creates a public key from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the public key as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    /// Returns the canonical Base58 text form.
    ///
    /// This is the same string shown to users as the address, so suffix
    /// matching must go through this method and nothing else.
    #[inline]
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_base58())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}
