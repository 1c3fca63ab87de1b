//! Core type definitions for docstore.

use std::fmt;

/// Local identifier of a record within a store.
///
/// Lids are dense small integers chosen by the store; they say nothing about
/// where the record is physically kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Lid(pub u32);

impl Lid {
    /// Highest lid a directory can address.
    pub const MAX_LID: Self = Self(u32::MAX - 1);

    /// Creates a new lid.
    #[must_use]
    pub const fn new(lid: u32) -> Self {
        Self(lid)
    }

    /// Returns the raw lid value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the lid as a table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Lid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lid:{}", self.0)
    }
}

impl From<u32> for Lid {
    fn from(lid: u32) -> Self {
        Self(lid)
    }
}

impl From<Lid> for u32 {
    fn from(lid: Lid) -> Self {
        lid.0
    }
}
