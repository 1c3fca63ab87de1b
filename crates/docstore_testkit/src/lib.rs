//! # Docstore Testkit
//!
//! Test utilities for docstore.
//!
//! This crate provides:
//! - Directory fixtures and tracing setup for tests
//! - Property-based test generators using proptest
//! - Concurrent stress harnesses for the lid directory
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docstore_testkit::prelude::*;
//!
//! #[test]
//! fn survives_contention() {
//!     let dir = striped_directory(8);
//!     let result = stress_concurrent_set_get(&dir, &StressConfig::quick());
//!     assert_eq!(result.torn_reads, 0);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
