//! Lid directory.
//!
//! [`LidDirectory`] is the reference implementation of [`SetLid`] and
//! [`GetLid`]. Each lid owns one `AtomicU64` slot holding the raw
//! [`PackedLocator`], so readers never see a torn value and never lock.
//!
//! ## Layout
//!
//! Slots live in fixed-size blocks reached through a spine:
//!
//! ```text
//! spine (ArcSwap) -> [ block 0 | block 1 | ... ]   block = [AtomicU64; block_size]
//! ```
//!
//! Growing clones the spine, appends new blocks and publishes the result.
//! Existing blocks are shared between the old and new spine, so a write that
//! lands through a stale spine is still visible through the new one. The old
//! spine is parked in a [`GenerationHoldList`] until every reader that could
//! have loaded it has dropped its guard.

use crate::capability::{GetLid, LidWriteGuard, LockScope, SetLid};
use crate::config::{DirectoryConfig, LockGranularity};
use crate::error::{CoreError, CoreResult};
use crate::generation::{Generation, GenerationGuard, GenerationHandler, GenerationHoldList};
use crate::locator::PackedLocator;
use crate::record::{sort_by_location, LidRecord, LidRecords};
use crate::stats::DirectoryStats;
use crate::types::Lid;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

type Block = Arc<[AtomicU64]>;
type Spine = Vec<Block>;

/// Lid-indexed table of record locators.
pub struct LidDirectory {
    /// Current spine. Readers load it without locking.
    spine: ArcSwap<Spine>,
    /// Slots per block.
    block_size: usize,
    /// Writer locks; one per stripe, or a single one for the whole table.
    locks: Box<[Mutex<()>]>,
    granularity: LockGranularity,
    /// Serializes growth and holds superseded spines.
    retired: Mutex<GenerationHoldList<Arc<Spine>>>,
    generations: GenerationHandler,
    /// One past the highest lid ever written.
    lid_limit: AtomicU64,
    stats: DirectoryStats,
}

impl LidDirectory {
    /// Creates a directory from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is rejected by
    /// [`DirectoryConfig::validate`].
    pub fn new(config: DirectoryConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self::build(&config))
    }

    /// Creates a directory with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::build(&DirectoryConfig::default())
    }

    fn build(config: &DirectoryConfig) -> Self {
        let blocks = config.initial_capacity.div_ceil(config.block_size);
        let spine: Spine = (0..blocks).map(|_| new_block(config.block_size)).collect();
        let locks = (0..config.lock_count()).map(|_| Mutex::new(())).collect();

        debug!(
            capacity = blocks * config.block_size,
            block_size = config.block_size,
            granularity = ?config.lock_granularity,
            "lid directory created"
        );

        Self {
            spine: ArcSwap::from_pointee(spine),
            block_size: config.block_size,
            locks,
            granularity: config.lock_granularity,
            retired: Mutex::new(GenerationHoldList::new()),
            generations: GenerationHandler::new(),
            lid_limit: AtomicU64::new(0),
            stats: DirectoryStats::new(),
        }
    }

    /// Returns the number of lids that can be stored without growing.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.spine.load().len() * self.block_size
    }

    /// Returns one past the highest lid ever written.
    #[must_use]
    pub fn lid_limit(&self) -> u64 {
        self.lid_limit.load(Ordering::Acquire)
    }

    /// Makes room for `lid` ahead of time.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LidOutOfRange`] if `lid` exceeds [`Lid::MAX_LID`].
    pub fn try_reserve(&self, lid: Lid) -> CoreResult<()> {
        if lid > Lid::MAX_LID {
            return Err(CoreError::LidOutOfRange {
                lid: lid.as_u32(),
                limit: u64::from(Lid::MAX_LID.as_u32()) + 1,
            });
        }
        self.ensure_capacity(lid.index() + 1);
        Ok(())
    }

    /// Advances the generation and drops retired storage no reader can see.
    ///
    /// Returns the new generation. Guards taken after this returns observe
    /// every `set_lid` that completed before it.
    pub fn commit(&self) -> Generation {
        let mut retired = self.retired.lock();
        self.advance(&mut retired)
    }

    /// Returns the generation handler readers register with.
    #[must_use]
    pub fn generation_handler(&self) -> &GenerationHandler {
        &self.generations
    }

    /// Returns the number of superseded spines still held for readers.
    #[must_use]
    pub fn held_snapshots(&self) -> usize {
        self.retired.lock().len()
    }

    /// Returns directory statistics.
    #[must_use]
    pub fn stats(&self) -> &DirectoryStats {
        &self.stats
    }

    /// Collects every lid that has a valid locator, in lid order.
    #[must_use]
    pub fn scan(&self, guard: &GenerationGuard) -> LidRecords {
        self.stats.record_scan();
        let limit = self.lid_limit();
        (0..limit)
            .filter_map(|raw| {
                let lid = Lid::new(u32::try_from(raw).ok()?);
                let locator = self.get_lid(guard, lid);
                locator.is_valid().then_some(LidRecord::new(locator, lid))
            })
            .collect()
    }

    /// Collects the records stored in `file_id`, sorted by location.
    #[must_use]
    pub fn scan_file(&self, guard: &GenerationGuard, file_id: u32) -> LidRecords {
        let mut records: LidRecords = self
            .scan(guard)
            .into_iter()
            .filter(|record| record.locator.file_id() == file_id)
            .collect();
        sort_by_location(&mut records);
        records
    }

    fn ensure_capacity(&self, needed: usize) {
        if self.capacity() >= needed {
            return;
        }

        let mut retired = self.retired.lock();
        let current = self.spine.load_full();
        let have = current.len();
        let wanted = needed.div_ceil(self.block_size);
        if have >= wanted {
            return;
        }

        let target = wanted.max(have * 2);
        let mut grown: Spine = Vec::with_capacity(target);
        grown.extend(current.iter().cloned());
        grown.extend((have..target).map(|_| new_block(self.block_size)));

        let previous = self.spine.swap(Arc::new(grown));
        retired.hold(self.generations.current_generation(), previous);
        self.stats.record_grow();

        debug!(
            from = have * self.block_size,
            to = target * self.block_size,
            "lid directory grown"
        );

        self.advance(&mut retired);
    }

    fn advance(&self, retired: &mut GenerationHoldList<Arc<Spine>>) -> Generation {
        let generation = self.generations.inc_generation();
        self.stats.record_generation();

        let reclaimed = retired.reclaim(self.generations.oldest_used_generation());
        if reclaimed > 0 {
            self.stats.record_reclaimed(reclaimed);
            trace!(reclaimed, held = retired.len(), "retired spines reclaimed");
        }
        generation
    }

    fn slot_position(&self, lid: Lid) -> (usize, usize) {
        (lid.index() / self.block_size, lid.index() % self.block_size)
    }
}

fn new_block(size: usize) -> Block {
    (0..size)
        .map(|_| AtomicU64::new(PackedLocator::INVALID.as_u64()))
        .collect()
}

impl SetLid for LidDirectory {
    fn set_lid(&self, guard: &LidWriteGuard<'_>, lid: Lid, locator: PackedLocator) {
        debug_assert!(guard.covers(lid), "write guard does not cover {lid}");
        debug_assert!(
            match (guard.scope(), self.granularity) {
                (LockScope::Table, LockGranularity::Table) => true,
                (LockScope::Stripe { stripes, .. }, LockGranularity::Striped(n)) => stripes == n,
                _ => false,
            },
            "write guard was not issued by this directory"
        );
        debug_assert!(lid <= Lid::MAX_LID, "{lid} exceeds the lid space");

        self.ensure_capacity(lid.index() + 1);

        let (block, offset) = self.slot_position(lid);
        let spine = self.spine.load();
        spine[block][offset].store(locator.as_u64(), Ordering::Release);

        self.lid_limit
            .fetch_max(u64::from(lid.as_u32()) + 1, Ordering::AcqRel);
        self.stats.record_write();
    }
}

impl GetLid for LidDirectory {
    fn get_lid(&self, _guard: &GenerationGuard, lid: Lid) -> PackedLocator {
        let (block, offset) = self.slot_position(lid);
        let spine = self.spine.load();
        spine.get(block).map_or(PackedLocator::INVALID, |slots| {
            PackedLocator::from_raw(slots[offset].load(Ordering::Acquire))
        })
    }

    fn get_lid_guard(&self, lid: Lid) -> LidWriteGuard<'_> {
        match self.granularity {
            LockGranularity::Table => LidWriteGuard::new(self.locks[0].lock(), LockScope::Table),
            LockGranularity::Striped(stripes) => {
                let index = lid.index() & (stripes - 1);
                LidWriteGuard::new(
                    self.locks[index].lock(),
                    LockScope::Stripe { index, stripes },
                )
            }
        }
    }

    fn get_lid_read_guard(&self) -> GenerationGuard {
        self.generations.take_guard()
    }
}

impl Default for LidDirectory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for LidDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LidDirectory")
            .field("capacity", &self.capacity())
            .field("lid_limit", &self.lid_limit())
            .field("granularity", &self.granularity)
            .field("generation", &self.generations.current_generation())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_directory(granularity: LockGranularity) -> LidDirectory {
        LidDirectory::new(
            DirectoryConfig::new()
                .block_size(8)
                .lock_granularity(granularity),
        )
        .unwrap()
    }

    fn put(dir: &LidDirectory, lid: u32, locator: PackedLocator) {
        let lid = Lid::new(lid);
        let guard = dir.get_lid_guard(lid);
        dir.set_lid(&guard, lid, locator);
    }

    #[test]
    fn unwritten_lid_is_invalid() {
        let dir = LidDirectory::with_defaults();
        let guard = dir.get_lid_read_guard();
        assert!(!dir.get_lid(&guard, Lid::new(0)).is_valid());
        assert!(!dir.get_lid(&guard, Lid::new(1_000_000)).is_valid());
    }

    #[test]
    fn set_then_get() {
        let dir = small_directory(LockGranularity::Striped(4));
        let locator = PackedLocator::new(1, 2, 300);
        put(&dir, 5, locator);

        let guard = dir.get_lid_read_guard();
        let read = dir.get_lid(&guard, Lid::new(5));
        assert_eq!(read.as_u64(), locator.as_u64());
        assert_eq!(dir.lid_limit(), 6);
    }

    #[test]
    fn set_overwrites() {
        let dir = small_directory(LockGranularity::Table);
        put(&dir, 1, PackedLocator::new(1, 1, 64));
        put(&dir, 1, PackedLocator::new(2, 7, 128));

        let guard = dir.get_lid_read_guard();
        let read = dir.get_lid(&guard, Lid::new(1));
        assert_eq!(read.file_id(), 2);
        assert_eq!(read.chunk_id(), 7);
        assert_eq!(read.size(), 128);
        assert_eq!(dir.stats().writes(), 2);
    }

    #[test]
    fn empty_locator_is_stored_as_is() {
        let dir = small_directory(LockGranularity::Table);
        put(&dir, 0, PackedLocator::new(3, 4, 0));

        let guard = dir.get_lid_read_guard();
        let read = dir.get_lid(&guard, Lid::new(0));
        assert!(read.is_valid());
        assert!(read.is_empty());
    }

    #[test]
    fn grows_on_demand() {
        let dir = small_directory(LockGranularity::Striped(2));
        assert_eq!(dir.capacity(), 0);

        put(&dir, 100, PackedLocator::new(1, 1, 64));
        assert!(dir.capacity() > 100);
        assert!(dir.stats().grows() >= 1);

        let guard = dir.get_lid_read_guard();
        assert!(dir.get_lid(&guard, Lid::new(100)).is_valid());
        assert!(!dir.get_lid(&guard, Lid::new(99)).is_valid());
    }

    #[test]
    fn growth_keeps_existing_values() {
        let dir = small_directory(LockGranularity::Table);
        for lid in 0..8 {
            put(&dir, lid, PackedLocator::new(1, lid, 64));
        }
        put(&dir, 1_000, PackedLocator::new(9, 9, 64));

        let guard = dir.get_lid_read_guard();
        for lid in 0..8 {
            assert_eq!(dir.get_lid(&guard, Lid::new(lid)).chunk_id(), lid);
        }
    }

    #[test]
    fn retired_spines_wait_for_readers() {
        let dir = small_directory(LockGranularity::Table);
        put(&dir, 0, PackedLocator::new(1, 1, 64));

        let reader = dir.get_lid_read_guard();
        put(&dir, 64, PackedLocator::new(1, 2, 64));
        assert_eq!(dir.held_snapshots(), 1);

        dir.commit();
        assert_eq!(dir.held_snapshots(), 1);

        drop(reader);
        dir.commit();
        assert_eq!(dir.held_snapshots(), 0);
        assert!(dir.stats().reclaimed() >= 1);
    }

    #[test]
    fn guard_after_commit_sees_write() {
        let dir = small_directory(LockGranularity::Striped(4));
        let before = dir.get_lid_read_guard();
        put(&dir, 3, PackedLocator::new(5, 6, 64));
        let generation = dir.commit();

        let after = dir.get_lid_read_guard();
        assert!(after.generation() >= generation);
        assert!(before.generation() < after.generation());
        assert_eq!(dir.get_lid(&after, Lid::new(3)).file_id(), 5);
    }

    #[test]
    fn try_reserve() {
        let dir = small_directory(LockGranularity::Table);
        dir.try_reserve(Lid::new(20)).unwrap();
        assert!(dir.capacity() >= 21);
        assert_eq!(dir.lid_limit(), 0);

        assert!(matches!(
            dir.try_reserve(Lid::new(u32::MAX)),
            Err(CoreError::LidOutOfRange { .. })
        ));
    }

    #[test]
    fn stripe_guard_scope() {
        let dir = small_directory(LockGranularity::Striped(4));
        let guard = dir.get_lid_guard(Lid::new(6));
        assert_eq!(
            guard.scope(),
            LockScope::Stripe {
                index: 2,
                stripes: 4
            }
        );
        assert!(guard.covers(Lid::new(10)));
        assert!(!guard.covers(Lid::new(7)));
    }

    #[test]
    fn stripes_lock_independently() {
        let dir = small_directory(LockGranularity::Striped(4));
        let _a = dir.get_lid_guard(Lid::new(0));
        let b = dir.get_lid_guard(Lid::new(1));
        dir.set_lid(&b, Lid::new(1), PackedLocator::new(1, 1, 64));
        assert!(dir.locks[0].try_lock().is_none());
        assert!(dir.locks[2].try_lock().is_some());
    }

    #[test]
    fn scan_in_lid_order() {
        let dir = small_directory(LockGranularity::Table);
        put(&dir, 4, PackedLocator::new(2, 1, 64));
        put(&dir, 1, PackedLocator::new(1, 9, 64));
        put(&dir, 2, PackedLocator::new(1, 3, 0));

        let guard = dir.get_lid_read_guard();
        let lids: Vec<u32> = dir.scan(&guard).iter().map(|r| r.lid.as_u32()).collect();
        assert_eq!(lids, vec![1, 2, 4]);
        assert_eq!(dir.stats().scans(), 1);
    }

    #[test]
    fn scan_file_sorted_by_location() {
        let dir = small_directory(LockGranularity::Table);
        put(&dir, 0, PackedLocator::new(1, 9, 64));
        put(&dir, 1, PackedLocator::new(2, 0, 64));
        put(&dir, 2, PackedLocator::new(1, 3, 64));
        put(&dir, 3, PackedLocator::new(1, 5, 64));

        let guard = dir.get_lid_read_guard();
        let records = dir.scan_file(&guard, 1);
        let lids: Vec<u32> = records.iter().map(|r| r.lid.as_u32()).collect();
        assert_eq!(lids, vec![2, 3, 0]);
    }

    #[test]
    fn usable_through_trait_objects() {
        let dir = LidDirectory::with_defaults();
        let writer: &dyn SetLid = &dir;
        let reader: &dyn GetLid = &dir;

        let lid = Lid::new(12);
        {
            let guard = reader.get_lid_guard(lid);
            writer.set_lid(&guard, lid, PackedLocator::new(4, 4, 64));
        }
        let guard = reader.get_lid_read_guard();
        assert_eq!(reader.get_lid(&guard, lid).file_id(), 4);
    }

    #[test]
    fn rejects_invalid_config() {
        let result = LidDirectory::new(DirectoryConfig::new().block_size(0));
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn initial_capacity_rounds_to_blocks() {
        let dir = LidDirectory::new(
            DirectoryConfig::new()
                .initial_capacity(10)
                .block_size(8),
        )
        .unwrap();
        assert_eq!(dir.capacity(), 16);
    }
}
