//! Test fixtures and directory helpers.

use docstore_core::{
    DirectoryConfig, GetLid, Lid, LidDirectory, LockGranularity, PackedLocator, SetLid,
};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a fmt subscriber for tests, once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Output goes
/// through the test writer so it is captured per test.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Creates a directory with a single table-wide write lock.
pub fn table_locked_directory() -> LidDirectory {
    LidDirectory::new(
        DirectoryConfig::new()
            .block_size(64)
            .lock_granularity(LockGranularity::Table),
    )
    .expect("table locked config is valid")
}

/// Creates a directory with `stripes` write locks.
///
/// # Panics
///
/// Panics if `stripes` is not a power of two.
pub fn striped_directory(stripes: usize) -> LidDirectory {
    LidDirectory::new(
        DirectoryConfig::new()
            .block_size(64)
            .lock_granularity(LockGranularity::Striped(stripes)),
    )
    .expect("stripe count must be a power of two")
}

/// Writes one locator under its own write guard.
pub fn write_lid<D>(dir: &D, lid: Lid, locator: PackedLocator)
where
    D: GetLid + SetLid + ?Sized,
{
    let guard = dir.get_lid_guard(lid);
    dir.set_lid(&guard, lid, locator);
}

/// Reads one locator under a fresh read guard.
pub fn read_lid<D>(dir: &D, lid: Lid) -> PackedLocator
where
    D: GetLid + ?Sized,
{
    let guard = dir.get_lid_read_guard();
    dir.get_lid(&guard, lid)
}

/// Fills lids `0..count` with locators spread over `files` files.
///
/// Lid `n` is stored in file `n % files`, chunk `n / files`, with a size of
/// `64 * (n + 1)` bytes.
pub fn populate(dir: &LidDirectory, count: u32, files: u32) {
    for n in 0..count {
        write_lid(dir, Lid::new(n), PackedLocator::new(n % files, n / files, 64 * (n + 1)));
    }
    dir.commit();
}
