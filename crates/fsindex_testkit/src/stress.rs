//! Stress tests for fsindex.
//!
//! Indexes have no locks of their own; these helpers hammer one index from
//! many threads to check that filesystem atomics alone keep the invariants.

use crate::fixtures::TestDataDir;
use crate::generators::uuid_key;
use fsindex_core::{Index, IndexError, IndexKind, NonUniqueIndex, UniqueIndex};
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Rounds per test; each round contends on a fresh value.
    pub rounds: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            rounds: 50,
        }
    }
}

impl StressConfig {
    /// Creates a light configuration for CI.
    pub fn light() -> Self {
        Self {
            threads: 4,
            rounds: 10,
        }
    }
}

/// Outcome of [`stress_unique_contention`].
#[derive(Debug, Clone)]
pub struct ContentionResult {
    /// Timing and counts over all adds.
    pub stats: StressTestResult,
    /// Winners per contested value.
    pub winners: BTreeMap<String, Vec<String>>,
    /// Losers that failed with something other than `AlreadyExists`.
    pub unexpected_errors: Vec<String>,
}

/// Every round, all threads add their own key under the same value of a
/// unique index at once. Exactly one add per value may succeed.
pub fn stress_unique_contention(dir: &TestDataDir, config: &StressConfig) -> ContentionResult {
    let index = Arc::new(
        UniqueIndex::new(dir.index_config("stress.Account", "Mail"))
            .expect("Failed to create index"),
    );
    index.init().expect("Failed to init index");

    let keys: Vec<String> = (0..config.threads).map(|_| uuid_key()).collect();
    for key in &keys {
        std::fs::write(dir.files_dir().join(key), b"{}").expect("Failed to write entity");
    }

    let barrier = Arc::new(Barrier::new(config.threads));
    let rounds = config.rounds;
    let start = Instant::now();

    let handles: Vec<_> = keys
        .into_iter()
        .map(|key| {
            let index = Arc::clone(&index);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut outcomes = Vec::with_capacity(rounds);
                for round in 0..rounds {
                    barrier.wait();
                    let value = format!("user{round}@example.com");
                    outcomes.push((value.clone(), index.add(&key, &value).map(|_| key.clone())));
                }
                outcomes
            })
        })
        .collect();

    let mut winners: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut unexpected_errors = Vec::new();
    let mut successful = 0;
    let mut failed = 0;
    for handle in handles {
        for (value, outcome) in handle.join().expect("Thread panicked") {
            match outcome {
                Ok(key) => {
                    successful += 1;
                    winners.entry(value).or_default().push(key);
                }
                Err(IndexError::AlreadyExists { .. }) => failed += 1,
                Err(other) => {
                    failed += 1;
                    unexpected_errors.push(other.to_string());
                }
            }
        }
    }

    ContentionResult {
        stats: StressTestResult::new(successful, failed, start.elapsed()),
        winners,
        unexpected_errors,
    }
}

/// Every thread owns one key and keeps moving it through a ring of values
/// of a shared non-unique index. Returns the index so the caller can check
/// where each key ended up, together with the expected final value per key.
pub fn stress_non_unique_moves(
    dir: &TestDataDir,
    config: &StressConfig,
) -> (StressTestResult, NonUniqueIndex, BTreeMap<String, String>) {
    const RING: [&str; 3] = ["Black", "Green", "White"];

    let index = Arc::new(
        NonUniqueIndex::new(dir.index_config("stress.Pet", "Color"))
            .expect("Failed to create index"),
    );
    index.init().expect("Failed to init index");
    assert_eq!(index.kind(), IndexKind::NonUnique);

    let keys: Vec<String> = (0..config.threads).map(|_| uuid_key()).collect();
    for key in &keys {
        std::fs::write(dir.files_dir().join(key), b"{}").expect("Failed to write entity");
        index.add(key, RING[0]).expect("Failed to seed entry");
    }

    let rounds = config.rounds;
    let start = Instant::now();
    let handles: Vec<_> = keys
        .iter()
        .cloned()
        .map(|key| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                let (mut ok, mut failed) = (0, 0);
                let mut current = 0;
                for _ in 0..rounds {
                    let next = (current + 1) % RING.len();
                    match index.update(&key, RING[current], RING[next]) {
                        Ok(()) => {
                            ok += 1;
                            current = next;
                        }
                        Err(_) => failed += 1,
                    }
                }
                (key, RING[current].to_owned(), ok, failed)
            })
        })
        .collect();

    let mut expected = BTreeMap::new();
    let (mut successful, mut failed) = (0, 0);
    for handle in handles {
        let (key, value, ok, err) = handle.join().expect("Thread panicked");
        expected.insert(key, value);
        successful += ok;
        failed += err;
    }

    let index = Arc::try_unwrap(index).unwrap_or_else(|shared| (*shared).clone());
    (
        StressTestResult::new(successful, failed, start.elapsed()),
        index,
        expected,
    )
}
