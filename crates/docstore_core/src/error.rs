//! Error types for docstore core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in docstore core operations.
///
/// Most contract violations in this crate are programming errors and panic or
/// debug-assert instead. These variants cover the checked entry points.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A locator component does not fit its bit budget.
    #[error("locator {field} out of range: {value} (limit {limit})")]
    LocatorOutOfRange {
        /// Name of the offending component.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Exclusive upper bound for the component.
        limit: u64,
    },

    /// A lid is beyond what the directory can address.
    #[error("lid {lid} out of range (limit {limit})")]
    LidOutOfRange {
        /// The rejected lid.
        lid: u32,
        /// Exclusive upper bound for lids.
        limit: u64,
    },

    /// Directory configuration is not usable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a locator out of range error.
    pub fn locator_out_of_range(field: &'static str, value: u64, limit: u64) -> Self {
        Self::LocatorOutOfRange {
            field,
            value,
            limit,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
