//! Ed25519 keypair generation.

use std::fmt;

use ed25519_dalek::SigningKey;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::Pubkey;

/// A Solana keypair (Ed25519 signing key + derived public key).
///
/// Deliberately not `Clone`: exactly one owner holds a keypair at a time,
/// and the signing key is zeroized when it is dropped.
pub struct Keypair {
    signing_key: SigningKey,
    pubkey: Pubkey,
}

impl Keypair {
    /// Generates a new random keypair from the given CSPRNG.
    #[inline]
    pub fn generate_with(rng: &mut StdRng) -> Self {
        Self::from_signing_key(SigningKey::generate(rng))
    }

    /// Generates a new random keypair using a freshly seeded OS-backed RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut StdRng::from_entropy())
    }

    /// Creates a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    #[inline]
    fn from_signing_key(signing_key: SigningKey) -> Self {
        let pubkey = Pubkey::from_bytes(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            pubkey,
        }
    }

    /// Returns the public key.
    #[inline]
    pub fn pubkey(&self) -> &Pubkey {
        &self.pubkey
    }

    /// Returns the 64-byte `secret || public` form used by Solana wallets.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    /// Returns the secret key in the Base58 form accepted by Solana tooling.
    pub fn secret_base58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}
