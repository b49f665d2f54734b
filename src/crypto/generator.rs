//! Key generators used by search workers.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::Keypair;

/// Source of candidate keypairs.
///
/// Each worker owns its own generator, so implementations never need
/// interior locking.
pub trait KeyGenerator: Send {
    /// Produces the next candidate keypair.
    fn generate(&mut self) -> Keypair;
}

/// Builds one generator per worker.
pub trait GeneratorFactory: Send + Sync {
    type Generator: KeyGenerator + 'static;

    /// Creates a generator for the worker with the given id.
    fn create(&self, worker_id: usize) -> Self::Generator;
}

impl<G, F> GeneratorFactory for F
where
    G: KeyGenerator + 'static,
    F: Fn(usize) -> G + Send + Sync,
{
    type Generator = G;

    fn create(&self, worker_id: usize) -> G {
        self(worker_id)
    }
}

/// Cryptographically secure generator with its own OS-seeded ChaCha state.
#[derive(Debug)]
pub struct RandomKeyGenerator {
    rng: StdRng,
}

impl RandomKeyGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Factory function suitable for [`crate::SearchCoordinator::with_factory`].
    pub fn for_worker(_worker_id: usize) -> Self {
        Self::new()
    }
}

impl Default for RandomKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator for RandomKeyGenerator {
    #[inline]
    fn generate(&mut self) -> Keypair {
        Keypair::generate_with(&mut self.rng)
    }
}
