//! Lid directory configuration.

use crate::error::{CoreError, CoreResult};

/// How writers of a [`LidDirectory`](crate::LidDirectory) are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockGranularity {
    /// One lock for the whole table.
    Table,
    /// Lids are spread over this many locks (must be a power of two).
    Striped(usize),
}

/// Configuration for creating a lid directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Number of lids to allocate up front.
    pub initial_capacity: usize,

    /// Number of lid slots per storage block. The table grows a block at a time.
    pub block_size: usize,

    /// Writer locking scheme.
    pub lock_granularity: LockGranularity,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            block_size: 4096,
            lock_granularity: LockGranularity::Striped(16),
        }
    }
}

impl DirectoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of lids allocated up front.
    #[must_use]
    pub const fn initial_capacity(mut self, lids: usize) -> Self {
        self.initial_capacity = lids;
        self
    }

    /// Sets the number of slots per storage block.
    #[must_use]
    pub const fn block_size(mut self, slots: usize) -> Self {
        self.block_size = slots;
        self
    }

    /// Sets the writer locking scheme.
    #[must_use]
    pub const fn lock_granularity(mut self, granularity: LockGranularity) -> Self {
        self.lock_granularity = granularity;
        self
    }

    /// Checks that the configuration can be used.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for a zero block size or a stripe
    /// count that is zero or not a power of two.
    pub fn validate(&self) -> CoreResult<()> {
        if self.block_size == 0 {
            return Err(CoreError::invalid_config("block size must be non-zero"));
        }
        if let LockGranularity::Striped(stripes) = self.lock_granularity {
            if !stripes.is_power_of_two() {
                return Err(CoreError::invalid_config(format!(
                    "stripe count must be a power of two, got {stripes}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn lock_count(&self) -> usize {
        match self.lock_granularity {
            LockGranularity::Table => 1,
            LockGranularity::Striped(stripes) => stripes,
        }
    }
}
