//! Property-based test generators using proptest.
//!
//! Provides strategies for generating locators and directory operations
//! that stay within the encodable ranges.

use docstore_core::{Lid, PackedLocator};
use proptest::prelude::*;

/// Strategy for generating in-range file ids.
pub fn file_id_strategy() -> impl Strategy<Value = u32> {
    0..PackedLocator::file_id_limit()
}

/// Strategy for generating in-range chunk ids.
pub fn chunk_id_strategy() -> impl Strategy<Value = u32> {
    0..PackedLocator::chunk_id_limit()
}

/// Strategy for generating encodable record sizes, biased towards the edges.
pub fn size_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        2 => 0..=PackedLocator::size_limit(),
        1 => 0..256u32,
        1 => (PackedLocator::size_limit() - 256)..=PackedLocator::size_limit(),
    ]
}

/// Strategy for generating valid locators.
pub fn locator_strategy() -> impl Strategy<Value = PackedLocator> {
    (file_id_strategy(), chunk_id_strategy(), size_strategy())
        .prop_map(|(file_id, chunk_id, size)| PackedLocator::new(file_id, chunk_id, size))
}

/// Strategy for generating lids below `max`.
pub fn lid_strategy(max: u32) -> impl Strategy<Value = Lid> {
    (0..max).prop_map(Lid::new)
}

/// A single directory operation.
#[derive(Debug, Clone)]
pub enum LidOperation {
    /// Install a locator.
    Set {
        /// Target lid
        lid: Lid,
        /// New locator
        locator: PackedLocator,
    },
    /// Read a locator.
    Get {
        /// Target lid
        lid: Lid,
    },
    /// Advance the directory generation.
    Commit,
}

/// Strategy for generating directory operations over lids below `max_lid`.
pub fn lid_operation_strategy(max_lid: u32) -> impl Strategy<Value = LidOperation> {
    prop_oneof![
        3 => (lid_strategy(max_lid), locator_strategy())
            .prop_map(|(lid, locator)| LidOperation::Set { lid, locator }),
        2 => lid_strategy(max_lid).prop_map(|lid| LidOperation::Get { lid }),
        1 => Just(LidOperation::Commit),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    max_lid: u32,
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<LidOperation>> {
    prop::collection::vec(lid_operation_strategy(max_lid), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_locators_are_valid(locator in locator_strategy()) {
            prop_assert!(locator.is_valid());
            prop_assert!(locator.file_id() < PackedLocator::file_id_limit());
            prop_assert!(locator.chunk_id() < PackedLocator::chunk_id_limit());
        }

        #[test]
        fn generated_lids_are_bounded(lid in lid_strategy(100)) {
            prop_assert!(lid.as_u32() < 100);
        }

        #[test]
        fn sequences_have_requested_length(ops in operation_sequence_strategy(16, 5, 10)) {
            prop_assert!((5..10).contains(&ops.len()));
        }
    }
}
