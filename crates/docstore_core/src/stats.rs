//! Lid directory statistics.
//!
//! All counters are relaxed atomics; they may be read while operations are in
//! progress and are only meant for monitoring. Point reads are not counted so
//! that `get_lid` stays free of shared writes.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Directory statistics and metrics.
#[derive(Debug, Default)]
pub struct DirectoryStats {
    /// Total number of full table scans.
    scans: AtomicU64,
    /// Total number of `set_lid` calls.
    writes: AtomicU64,
    /// Number of times the table grew.
    grows: AtomicU64,
    /// Number of generation bumps issued by the directory.
    generations: AtomicU64,
    /// Number of retired table snapshots dropped.
    reclaimed: AtomicU64,
}

impl DirectoryStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_grow(&self) {
        self.grows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_generation(&self) {
        self.generations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reclaimed(&self, count: usize) {
        self.reclaimed.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Returns the total number of full table scans.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Returns the total number of writes.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of times the table grew.
    pub fn grows(&self) -> u64 {
        self.grows.load(Ordering::Relaxed)
    }

    /// Returns the number of generation bumps.
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }

    /// Returns the number of reclaimed table snapshots.
    pub fn reclaimed(&self) -> u64 {
        self.reclaimed.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            scans: self.scans(),
            writes: self.writes(),
            grows: self.grows(),
            generations: self.generations(),
            reclaimed: self.reclaimed(),
        }
    }
}

/// A point-in-time copy of [`DirectoryStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Total number of full table scans.
    pub scans: u64,
    /// Total number of writes.
    pub writes: u64,
    /// Number of times the table grew.
    pub grows: u64,
    /// Number of generation bumps.
    pub generations: u64,
    /// Number of reclaimed table snapshots.
    pub reclaimed: u64,
}
