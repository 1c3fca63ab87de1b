//! Benchmark utilities.

#![warn(missing_docs)]

use docstore_core::{GetLid, Lid, LidDirectory, PackedLocator, SetLid};
use rand::Rng;

/// Generate random in-range locator components.
pub fn random_components(count: usize) -> Vec<(u32, u32, u32)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            (
                rng.gen_range(0..PackedLocator::file_id_limit()),
                rng.gen_range(0..PackedLocator::chunk_id_limit()),
                rng.gen_range(0..1 << 20),
            )
        })
        .collect()
}

/// Generate random lids below `limit`.
pub fn random_lids(count: usize, limit: u32) -> Vec<Lid> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| Lid::new(rng.gen_range(0..limit))).collect()
}

/// Creates a directory with lids `0..count` written.
pub fn filled_directory(count: u32) -> LidDirectory {
    let dir = LidDirectory::with_defaults();
    for n in 0..count {
        let lid = Lid::new(n);
        let guard = dir.get_lid_guard(lid);
        dir.set_lid(&guard, lid, PackedLocator::new(n % 64, n, 1024));
    }
    dir.commit();
    dir
}
