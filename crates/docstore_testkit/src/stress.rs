//! Stress tests for the lid directory.
//!
//! These harnesses drive a directory from many threads and count reads that
//! violate the read contract. A correct directory reports zero violations.

use docstore_core::{GetLid, Lid, LidDirectory, PackedLocator, SetLid};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total `set_lid` calls.
    pub writes: usize,
    /// Total `get_lid` calls.
    pub reads: usize,
    /// Reads that returned a value no writer installed.
    pub torn_reads: usize,
    /// Reads that returned a value older than a committed write.
    pub stale_reads: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    fn new(
        writes: usize,
        reads: usize,
        torn_reads: usize,
        stale_reads: usize,
        duration: Duration,
    ) -> Self {
        let total = writes + reads;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            writes,
            reads,
            torn_reads,
            stale_reads,
            duration,
            ops_per_second,
        }
    }

    /// Returns true if no read violated the contract.
    pub fn is_clean(&self) -> bool {
        self.torn_reads == 0 && self.stale_reads == 0
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Writes: {}", self.writes);
        println!("Reads: {}", self.reads);
        println!("Torn reads: {}", self.torn_reads);
        println!("Stale reads: {}", self.stale_reads);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of writer threads.
    pub writers: usize,
    /// Number of reader threads.
    pub readers: usize,
    /// Number of distinct lids touched.
    pub lid_count: u32,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            writers: 4,
            readers: 4,
            lid_count: 1_000,
        }
    }
}

impl StressConfig {
    /// Creates a small configuration suitable for unit tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            operations: 1_000,
            writers: 2,
            readers: 4,
            lid_count: 64,
        }
    }
}

/// Locator written by `writer` in its `round`-th write.
///
/// The size is derived from the writer so a reader can tell whether the word
/// it got was installed as a whole.
fn writer_locator(writer: usize, round: usize) -> PackedLocator {
    let file_id = writer as u32;
    let chunk_id = (round as u32) % PackedLocator::chunk_id_limit();
    PackedLocator::new(file_id, chunk_id, 64 * (file_id + 1))
}

fn is_writer_locator(locator: PackedLocator, writers: usize) -> bool {
    let file_id = locator.file_id();
    (file_id as usize) < writers && locator.size() == 64 * (file_id + 1)
}

/// Runs writers and readers concurrently against the same lids.
///
/// Writers overwrite lids round-robin; readers hold one guard per batch of
/// reads and check that every valid locator they see was installed whole.
pub fn stress_concurrent_set_get(dir: &LidDirectory, config: &StressConfig) -> StressTestResult {
    let reads = AtomicUsize::new(0);
    let torn = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for writer in 0..config.writers {
            scope.spawn(move || {
                for round in 0..config.operations {
                    let lid = Lid::new((round as u32 + writer as u32) % config.lid_count);
                    let guard = dir.get_lid_guard(lid);
                    dir.set_lid(&guard, lid, writer_locator(writer, round));
                    drop(guard);
                    if round % 256 == 0 {
                        dir.commit();
                    }
                }
            });
        }

        for _ in 0..config.readers {
            scope.spawn(|| {
                let mut local_reads = 0;
                let mut local_torn = 0;
                for batch in 0..config.operations.div_ceil(16) {
                    let guard = dir.get_lid_read_guard();
                    for i in 0..16u32 {
                        let lid = Lid::new((batch as u32 * 16 + i) % config.lid_count);
                        let locator = dir.get_lid(&guard, lid);
                        local_reads += 1;
                        if locator.is_valid() && !is_writer_locator(locator, config.writers) {
                            local_torn += 1;
                        }
                    }
                }
                reads.fetch_add(local_reads, Ordering::Relaxed);
                torn.fetch_add(local_torn, Ordering::Relaxed);
            });
        }
    });

    let result = StressTestResult::new(
        config.writers * config.operations,
        reads.into_inner(),
        torn.into_inner(),
        0,
        start.elapsed(),
    );
    debug!(?result, "concurrent set/get finished");
    result
}

/// Checks that readers registered after a commit observe the committed round.
///
/// Each round rewrites every lid with the round number as chunk id, commits,
/// then lets reader threads verify that no lid shows an earlier round.
pub fn stress_commit_visibility(
    dir: &LidDirectory,
    config: &StressConfig,
    rounds: usize,
) -> StressTestResult {
    let mut reads = 0;
    let mut stale = 0;
    let mut torn = 0;
    let start = Instant::now();

    for round in 0..rounds {
        for n in 0..config.lid_count {
            let lid = Lid::new(n);
            let guard = dir.get_lid_guard(lid);
            dir.set_lid(&guard, lid, writer_locator(0, round));
        }
        dir.commit();

        let round_stale = AtomicUsize::new(0);
        let round_torn = AtomicUsize::new(0);
        thread::scope(|scope| {
            for _ in 0..config.readers {
                scope.spawn(|| {
                    let guard = dir.get_lid_read_guard();
                    for n in 0..config.lid_count {
                        let locator = dir.get_lid(&guard, Lid::new(n));
                        if !is_writer_locator(locator, 1) {
                            round_torn.fetch_add(1, Ordering::Relaxed);
                        } else if (locator.chunk_id() as usize) < round {
                            round_stale.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        reads += config.readers * config.lid_count as usize;
        stale += round_stale.into_inner();
        torn += round_torn.into_inner();
    }

    StressTestResult::new(
        rounds * config.lid_count as usize,
        reads,
        torn,
        stale,
        start.elapsed(),
    )
}
