use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sol_vanity::{
    FallbackReason, KeyGenerator, Keypair, MatchKind, SearchConfig, SearchCoordinator,
    SearchOutcome, SuffixError,
};

/// Cycles through a fixed set of seeds.
struct SeedCycle {
    seeds: Vec<[u8; 32]>,
    next: usize,
}

impl SeedCycle {
    fn new(seeds: Vec<[u8; 32]>) -> Self {
        Self { seeds, next: 0 }
    }
}

impl KeyGenerator for SeedCycle {
    fn generate(&mut self) -> Keypair {
        let seed = self.seeds[self.next % self.seeds.len()];
        self.next += 1;
        Keypair::from_seed(&seed)
    }
}

/// Simulates a crashing worker.
struct Exploding;

impl KeyGenerator for Exploding {
    fn generate(&mut self) -> Keypair {
        panic!("generator exploded");
    }
}

enum Stub {
    Seeds(SeedCycle),
    Exploding(Exploding),
}

impl KeyGenerator for Stub {
    fn generate(&mut self) -> Keypair {
        match self {
            Stub::Seeds(g) => g.generate(),
            Stub::Exploding(g) => g.generate(),
        }
    }
}

fn seed(n: u32) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..4].copy_from_slice(&n.to_le_bytes());
    seed
}

fn encoding(seed: &[u8; 32]) -> String {
    Keypair::from_seed(seed).pubkey().to_base58()
}

/// A seed, the three-character suffix its key ends with, and a seed whose
/// key matches that suffix in no case.
fn hit_and_miss() -> ([u8; 32], String, [u8; 32]) {
    let hit = seed(1);
    let encoded = encoding(&hit);
    let suffix = encoded[encoded.len() - 3..].to_string();
    let lower = suffix.to_ascii_lowercase();
    let miss = (2..)
        .map(seed)
        .find(|s| !encoding(s).to_ascii_lowercase().ends_with(&lower))
        .unwrap();
    (hit, suffix, miss)
}

fn config(workers: usize) -> SearchConfig {
    SearchConfig {
        workers: Some(workers),
        ..SearchConfig::default()
    }
}

#[test]
fn test_empty_suffix_never_creates_workers() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let coordinator = SearchCoordinator::with_factory(config(4), move |_id: usize| {
        counter.fetch_add(1, Ordering::SeqCst);
        SeedCycle::new(vec![seed(1)])
    });

    let result = coordinator.generate("");
    assert_eq!(created.load(Ordering::SeqCst), 0);
    assert!(!result.diagnostics.matched);
    assert_eq!(result.diagnostics.match_kind, None);
    assert_eq!(
        result.diagnostics.fallback,
        Some(FallbackReason::NoSuffixRequested)
    );
}

#[test]
fn test_invalid_suffix_falls_back_without_searching() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let coordinator = SearchCoordinator::with_factory(config(4), move |_id: usize| {
        counter.fetch_add(1, Ordering::SeqCst);
        SeedCycle::new(vec![seed(1)])
    });

    for bad in ["0", "pumpl", "OIO", "sol ana"] {
        let result = coordinator.generate(bad);
        assert!(!result.diagnostics.matched);
        assert_eq!(result.diagnostics.fallback, Some(FallbackReason::InvalidSuffix));
    }
    assert_eq!(created.load(Ordering::SeqCst), 0);

    assert!(matches!(
        coordinator.search("0", 1_000, 8),
        SearchOutcome::Invalid(SuffixError::InvalidCharacter { ch: '0', position: 0 })
    ));
}

#[test]
fn test_first_match_wins_and_stops_other_workers() {
    let (hit, suffix, miss) = hit_and_miss();
    let coordinator = SearchCoordinator::with_factory(config(4), move |id: usize| {
        if id == 0 {
            SeedCycle::new(vec![miss, miss, hit])
        } else {
            SeedCycle::new(vec![miss])
        }
    });

    // Losers would run for a very long time unless they are cancelled
    let budget = u64::MAX / 2;
    match coordinator.search(&suffix, budget, 8) {
        SearchOutcome::Matched {
            keypair,
            attempts,
            match_kind,
            workers,
            ..
        } => {
            assert_eq!(keypair.pubkey(), Keypair::from_seed(&hit).pubkey());
            assert_eq!(match_kind, MatchKind::Exact);
            assert_eq!(workers, 4);
            assert!(attempts >= 3);
            assert!(attempts < budget);
        }
        other => panic!("expected a match, got {:?}", other),
    }
}

#[test]
fn test_never_matching_generator_exhausts_and_falls_back() {
    let (_, suffix, miss) = hit_and_miss();
    let coordinator = SearchCoordinator::with_factory(
        SearchConfig {
            total_budget: 4_000,
            ..config(4)
        },
        move |_id: usize| SeedCycle::new(vec![miss]),
    );

    let result = coordinator.generate(&suffix);
    assert!(!result.diagnostics.matched);
    assert_eq!(result.diagnostics.attempts, 4_000);
    assert_eq!(result.diagnostics.workers, 4);
    assert_eq!(
        result.diagnostics.fallback,
        Some(FallbackReason::BudgetExhausted)
    );
}

#[test]
fn test_uneven_budget_rounds_up_per_worker() {
    let (_, suffix, miss) = hit_and_miss();
    let coordinator =
        SearchCoordinator::with_factory(config(4), move |_id: usize| SeedCycle::new(vec![miss]));

    // ceil(10 / 4) = 3 attempts for each of 4 workers
    match coordinator.search(&suffix, 10, 8) {
        SearchOutcome::Exhausted {
            attempts, workers, ..
        } => {
            assert_eq!(workers, 4);
            assert_eq!(attempts, 12);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn test_eight_workers_split_budget_evenly() {
    let (_, suffix, miss) = hit_and_miss();
    let coordinator =
        SearchCoordinator::with_factory(config(8), move |_id: usize| SeedCycle::new(vec![miss]));

    match coordinator.search(&suffix, 8_000, 8) {
        SearchOutcome::Exhausted {
            attempts, workers, ..
        } => {
            assert_eq!(workers, 8);
            assert_eq!(attempts, 8_000);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn test_worker_crash_retries_on_single_worker() {
    let (hit, suffix, _) = hit_and_miss();
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();

    // The four pooled workers crash; the retry gets a working generator
    let coordinator = SearchCoordinator::with_factory(config(4), move |_id: usize| {
        if counter.fetch_add(1, Ordering::SeqCst) < 4 {
            Stub::Exploding(Exploding)
        } else {
            Stub::Seeds(SeedCycle::new(vec![hit]))
        }
    });

    assert!(coordinator.search(&suffix, 1_000, 8).is_matched());
    created.store(0, Ordering::SeqCst);

    let result = coordinator.generate(&suffix);
    assert_eq!(created.load(Ordering::SeqCst), 5);
    assert!(result.diagnostics.matched);
    assert_eq!(result.diagnostics.workers, 1);
    assert_eq!(result.diagnostics.fallback, None);
    assert_eq!(result.keypair.pubkey(), Keypair::from_seed(&hit).pubkey());
}

#[test]
fn test_crash_during_retry_falls_back() {
    let (_, suffix, _) = hit_and_miss();
    let coordinator = SearchCoordinator::with_factory(config(4), |_id: usize| Exploding);

    assert!(matches!(
        coordinator.search(&suffix, 1_000, 8),
        SearchOutcome::Failed { .. }
    ));

    let result = coordinator.generate(&suffix);
    assert!(!result.diagnostics.matched);
    assert_eq!(result.diagnostics.fallback, Some(FallbackReason::WorkerFailure));
}

#[test]
fn test_found_key_always_satisfies_suffix() {
    let coordinator = SearchCoordinator::new(SearchConfig {
        min_parallel_len: 1,
        ..config(4)
    });

    for suffix in ["A", "z", "Ab"] {
        let result = coordinator.generate(suffix);
        assert!(result.diagnostics.matched, "no match for {:?}", suffix);

        let encoded = result.keypair.pubkey().to_base58();
        match result.diagnostics.match_kind {
            Some(MatchKind::Exact) => assert!(encoded.ends_with(suffix)),
            Some(MatchKind::CaseInsensitive) => {
                assert!(!encoded.ends_with(suffix));
                assert!(encoded
                    .to_ascii_lowercase()
                    .ends_with(&suffix.to_ascii_lowercase()));
            }
            None => panic!("matched without a match kind"),
        }
    }
}

#[test]
fn test_single_digit_without_parallelism() {
    let coordinator = SearchCoordinator::new(SearchConfig {
        enable_parallel: false,
        ..config(8)
    });

    let result = coordinator.generate("7");
    assert!(result.diagnostics.matched);
    assert_eq!(result.diagnostics.workers, 1);
    assert!(result.diagnostics.attempts <= 300_000);
    assert!(result.keypair.pubkey().to_base58().ends_with('7'));
}

#[test]
fn test_zero_budget_returns_unmatched_fallback() {
    let coordinator = SearchCoordinator::new(SearchConfig {
        total_budget: 0,
        ..config(4)
    });

    for suffix in ["7", "pump"] {
        let result = coordinator.generate(suffix);
        assert!(!result.diagnostics.matched);
        assert_eq!(result.diagnostics.attempts, 0);
        assert_eq!(
            result.diagnostics.fallback,
            Some(FallbackReason::BudgetExhausted)
        );
    }
}

#[test]
fn test_timeout_stops_parallel_search() {
    let (_, suffix, miss) = hit_and_miss();
    let coordinator = SearchCoordinator::with_factory(
        SearchConfig {
            total_budget: u64::MAX,
            timeout: Some(Duration::from_millis(200)),
            ..config(4)
        },
        move |_id: usize| SeedCycle::new(vec![miss]),
    );

    let outcome = coordinator.search(&suffix, u64::MAX, 8);
    assert!(!outcome.is_matched());
    match outcome {
        SearchOutcome::Exhausted {
            attempts,
            elapsed,
            workers,
        } => {
            assert_eq!(workers, 4);
            assert!(attempts > 0);
            assert!(elapsed >= Duration::from_millis(200));
            assert!(elapsed < Duration::from_secs(30));
        }
        other => panic!("expected a timed-out search, got {:?}", other),
    }
}

#[test]
fn test_timeout_stops_single_worker_search() {
    let (_, suffix, miss) = hit_and_miss();
    let coordinator = SearchCoordinator::with_factory(
        SearchConfig {
            enable_parallel: false,
            total_budget: u64::MAX,
            single_thread_budget: u64::MAX,
            timeout: Some(Duration::from_millis(200)),
            ..config(4)
        },
        move |_id: usize| SeedCycle::new(vec![miss]),
    );

    let result = coordinator.generate(&suffix);
    assert!(!result.diagnostics.matched);
    assert_eq!(result.diagnostics.workers, 1);
    assert!(result.diagnostics.elapsed < Duration::from_secs(30));
    assert_eq!(
        result.diagnostics.fallback,
        Some(FallbackReason::BudgetExhausted)
    );
}

#[test]
fn test_timeout_covers_retry_after_crash() {
    let (_, suffix, miss) = hit_and_miss();
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();

    // The pool crashes at once; the retry never matches and has no budget limit
    let coordinator = SearchCoordinator::with_factory(
        SearchConfig {
            single_thread_budget: u64::MAX,
            timeout: Some(Duration::from_millis(200)),
            ..config(4)
        },
        move |_id: usize| {
            if counter.fetch_add(1, Ordering::SeqCst) < 4 {
                Stub::Exploding(Exploding)
            } else {
                Stub::Seeds(SeedCycle::new(vec![miss]))
            }
        },
    );

    match coordinator.search(&suffix, u64::MAX, 8) {
        SearchOutcome::Exhausted {
            elapsed, workers, ..
        } => {
            assert_eq!(created.load(Ordering::SeqCst), 5);
            assert_eq!(workers, 1);
            assert!(elapsed < Duration::from_secs(30));
        }
        other => panic!("expected a timed-out retry, got {:?}", other),
    }
}
