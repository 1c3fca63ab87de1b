//! Read and write capabilities over a lid directory.
//!
//! A lid directory maps each [`Lid`] to the [`PackedLocator`] of its record.
//! Subsystems do not depend on the concrete directory; the writer pipeline
//! holds a `&dyn SetLid`, the read and compaction paths a `&dyn GetLid`.
//!
//! ## Access Discipline
//!
//! - Writers take a [`LidWriteGuard`] with [`GetLid::get_lid_guard`] and pass it
//!   to [`SetLid::set_lid`]. Whether the guard locks the whole table or only a
//!   stripe containing the lid is up to the directory.
//! - Readers take one [`GenerationGuard`] with [`GetLid::get_lid_read_guard`]
//!   and may then call [`GetLid::get_lid`] any number of times without locking.
//!
//! Calling `set_lid` with a guard that does not cover the lid is a programming
//! error. Directories check it with `debug_assert!` only.

use crate::generation::GenerationGuard;
use crate::locator::PackedLocator;
use crate::types::Lid;
use parking_lot::MutexGuard;
use std::fmt;

/// What a [`LidWriteGuard`] protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    /// Every lid in the table.
    Table,
    /// Lids with `lid % stripes == index`.
    Stripe {
        /// Stripe this guard holds.
        index: usize,
        /// Total number of stripes in the directory.
        stripes: usize,
    },
}

impl LockScope {
    /// Returns true if a guard with this scope protects `lid`.
    #[must_use]
    pub fn covers(self, lid: Lid) -> bool {
        match self {
            Self::Table => true,
            Self::Stripe { index, stripes } => lid.index() % stripes == index,
        }
    }
}

/// Proof of exclusive write access to one or more lids.
///
/// The lock is released when the guard is dropped.
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct LidWriteGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    scope: LockScope,
}

impl<'a> LidWriteGuard<'a> {
    /// Wraps a held lock together with the lids it protects.
    pub fn new(lock: MutexGuard<'a, ()>, scope: LockScope) -> Self {
        Self { _lock: lock, scope }
    }

    /// Returns the scope of this guard.
    pub fn scope(&self) -> LockScope {
        self.scope
    }

    /// Returns true if this guard protects `lid`.
    pub fn covers(&self, lid: Lid) -> bool {
        self.scope.covers(lid)
    }
}

impl fmt::Debug for LidWriteGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LidWriteGuard")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Mutation side of a lid directory.
pub trait SetLid: Send + Sync {
    /// Installs `locator` as the location of `lid`, replacing any prior value.
    ///
    /// This is the only way a lid's value changes. `guard` must come from
    /// [`GetLid::get_lid_guard`] for this lid on the same directory.
    fn set_lid(&self, guard: &LidWriteGuard<'_>, lid: Lid, locator: PackedLocator);
}

/// Read side of a lid directory.
pub trait GetLid: Send + Sync {
    /// Returns the current locator of `lid`.
    ///
    /// Lids that were never written read as [`PackedLocator::INVALID`]. The
    /// call never blocks and never returns a partially written value.
    fn get_lid(&self, guard: &GenerationGuard, lid: Lid) -> PackedLocator;

    /// Acquires a write guard sufficient to call [`SetLid::set_lid`] for `lid`.
    ///
    /// Callers must not assume anything about the guard's granularity beyond
    /// that it covers `lid`.
    fn get_lid_guard(&self, lid: Lid) -> LidWriteGuard<'_>;

    /// Registers the caller as a reader of the current generation.
    ///
    /// Hold the guard for the duration of one logically consistent read.
    fn get_lid_read_guard(&self) -> GenerationGuard;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn table_scope_covers_everything() {
        assert!(LockScope::Table.covers(Lid::new(0)));
        assert!(LockScope::Table.covers(Lid::MAX_LID));
    }

    #[test]
    fn stripe_scope_covers_its_residue() {
        let scope = LockScope::Stripe {
            index: 3,
            stripes: 8,
        };
        assert!(scope.covers(Lid::new(3)));
        assert!(scope.covers(Lid::new(11)));
        assert!(!scope.covers(Lid::new(4)));
    }

    #[test]
    fn guard_releases_on_drop() {
        let lock = Mutex::new(());
        {
            let guard = LidWriteGuard::new(lock.lock(), LockScope::Table);
            assert!(guard.covers(Lid::new(5)));
            assert!(lock.try_lock().is_none());
        }
        assert!(lock.try_lock().is_some());
    }
}
