//! Locator paired with its lid.

use crate::locator::PackedLocator;
use crate::types::Lid;
use std::cmp::Ordering;

/// A record locator together with the lid it belongs to.
///
/// Produced when a scan needs to hand both key and value to a consumer,
/// for example when collecting the records of one file for compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LidRecord {
    /// Where the record lives.
    pub locator: PackedLocator,
    /// The lid the locator belongs to.
    pub lid: Lid,
}

/// An ordered batch of lid records.
pub type LidRecords = Vec<LidRecord>;

impl LidRecord {
    /// Creates a new lid record.
    #[must_use]
    pub const fn new(locator: PackedLocator, lid: Lid) -> Self {
        Self { locator, lid }
    }

    /// Returns the lid.
    #[must_use]
    pub const fn lid(&self) -> Lid {
        self.lid
    }

    /// Returns the locator.
    #[must_use]
    pub const fn locator(&self) -> PackedLocator {
        self.locator
    }

    /// Compares two records by physical location, then by lid.
    ///
    /// Sorting with this yields the order records appear on disk.
    #[must_use]
    pub fn cmp_by_location(&self, other: &Self) -> Ordering {
        self.locator
            .cmp(&other.locator)
            .then_with(|| self.lid.cmp(&other.lid))
    }
}

/// Sorts records by physical location.
pub fn sort_by_location(records: &mut [LidRecord]) {
    records.sort_unstable_by(LidRecord::cmp_by_location);
}
