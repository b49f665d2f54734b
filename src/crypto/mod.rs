//! Cryptographic operations for Solana key generation.
//!
//! This module provides:
//! - Ed25519 keypair generation from a per-owner CSPRNG
//! - Base58 public key encoding
//! - The `KeyGenerator` seam that workers draw candidates from

mod generator;
mod keypair;
mod pubkey;

pub use generator::{GeneratorFactory, KeyGenerator, RandomKeyGenerator};
pub use keypair::Keypair;
pub use pubkey::{Pubkey, MAX_ENCODED_LEN, PUBKEY_LEN};
