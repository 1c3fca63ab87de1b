//! # Docstore Core
//!
//! Record location bookkeeping for the docstore.
//!
//! This crate provides:
//! - [`PackedLocator`], the 64-bit (file, chunk, size) encoding of where a
//!   record lives
//! - [`LidRecord`], a locator paired with the lid it describes
//! - The [`SetLid`] / [`GetLid`] capability traits for writing and reading a
//!   lid-indexed location table
//! - [`GenerationHandler`], the reader registration used to defer reclamation
//! - [`LidDirectory`], a lock-free-read directory implementing both traits

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod capability;
mod config;
mod directory;
mod error;
mod generation;
mod locator;
mod record;
mod stats;
mod types;

pub use capability::{GetLid, LidWriteGuard, LockScope, SetLid};
pub use config::{DirectoryConfig, LockGranularity};
pub use directory::LidDirectory;
pub use error::{CoreError, CoreResult};
pub use generation::{Generation, GenerationGuard, GenerationHandler, GenerationHoldList};
pub use locator::PackedLocator;
pub use record::{sort_by_location, LidRecord, LidRecords};
pub use stats::{DirectoryStats, StatsSnapshot};
pub use types::Lid;
