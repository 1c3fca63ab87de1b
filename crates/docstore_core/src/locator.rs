//! Packed record locator.
//!
//! A [`PackedLocator`] says where a record lives: the file that owns it, the
//! chunk inside that file, and the record size. All three are packed into a
//! single `u64` so a lid table entry can be read and replaced atomically.
//!
//! ## Bit Layout
//!
//! ```text
//! | size_units (26) | chunk_id (22) | file_id (16) |
//!   bit 63      38    bit 37     16   bit 15      0
//! ```
//!
//! The size is stored in 64-byte units, rounded up. The all-ones word is
//! reserved as the "no location yet" sentinel.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

const FILE_BITS: u32 = 16;
const CHUNK_BITS: u32 = 22;
const SIZE_BITS: u32 = 26;
const SIZE_SHIFT: u32 = 32 - SIZE_BITS;

const FILE_OFFSET: u32 = 0;
const CHUNK_OFFSET: u32 = FILE_OFFSET + FILE_BITS;
const SIZE_OFFSET: u32 = CHUNK_OFFSET + CHUNK_BITS;

const FILE_MASK: u64 = (1 << FILE_BITS) - 1;
const CHUNK_MASK: u64 = (1 << CHUNK_BITS) - 1;
const SIZE_MASK: u64 = (1 << SIZE_BITS) - 1;

const ALIGNMENT: u32 = 1 << SIZE_SHIFT;

// Largest byte size whose unit count stays below the all-ones size field, so
// (max file, max chunk, max size) can never alias the sentinel.
const SIZE_LIMIT: u32 = u32::MAX - ((2 << SIZE_SHIFT) - 1);

const _: () = assert!(FILE_BITS + CHUNK_BITS + SIZE_BITS == 64);
const _: () = assert!(((SIZE_LIMIT as u64 + ALIGNMENT as u64 - 1) >> SIZE_SHIFT) < SIZE_MASK);

/// Location of a stored record, packed into 64 bits.
///
/// Equality, hashing and ordering only look at `(file_id, chunk_id)`; the
/// size never takes part. Two locators pointing at the same chunk with
/// different sizes compare equal.
///
/// `Default` is the [`INVALID`](Self::INVALID) sentinel, not zero.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedLocator(u64);

impl PackedLocator {
    /// The reserved "no location" value (all bits set).
    pub const INVALID: Self = Self(u64::MAX);

    /// Creates a locator from its components.
    ///
    /// The size is rounded up to the next multiple of 64 bytes.
    ///
    /// # Panics
    ///
    /// Panics if `file_id >= file_id_limit()`, `chunk_id >= chunk_id_limit()`
    /// or `size > size_limit()`. These bounds are capacity invariants of the
    /// enclosing store; use [`try_new`](Self::try_new) for input that has not
    /// been validated yet.
    #[must_use]
    pub fn new(file_id: u32, chunk_id: u32, size: u32) -> Self {
        assert!(
            file_id < Self::file_id_limit(),
            "file_id {file_id} exceeds {FILE_BITS} bits"
        );
        assert!(
            chunk_id < Self::chunk_id_limit(),
            "chunk_id {chunk_id} exceeds {CHUNK_BITS} bits"
        );
        assert!(
            size <= Self::size_limit(),
            "size {size} exceeds limit {SIZE_LIMIT}"
        );
        Self::pack(file_id, chunk_id, size)
    }

    /// Creates a locator from its components, rejecting out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LocatorOutOfRange`] naming the first component that
    /// does not fit.
    pub fn try_new(file_id: u32, chunk_id: u32, size: u32) -> CoreResult<Self> {
        if file_id >= Self::file_id_limit() {
            return Err(CoreError::locator_out_of_range(
                "file_id",
                u64::from(file_id),
                u64::from(Self::file_id_limit()),
            ));
        }
        if chunk_id >= Self::chunk_id_limit() {
            return Err(CoreError::locator_out_of_range(
                "chunk_id",
                u64::from(chunk_id),
                u64::from(Self::chunk_id_limit()),
            ));
        }
        if size > Self::size_limit() {
            return Err(CoreError::locator_out_of_range(
                "size",
                u64::from(size),
                u64::from(Self::size_limit()) + 1,
            ));
        }
        Ok(Self::pack(file_id, chunk_id, size))
    }

    /// Reinterprets a raw word as a locator.
    ///
    /// No validation: only use this for values that came out of
    /// [`as_u64`](Self::as_u64), e.g. when loading persisted state.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the owning file id.
    #[inline]
    #[must_use]
    pub const fn file_id(self) -> u32 {
        ((self.0 >> FILE_OFFSET) & FILE_MASK) as u32
    }

    /// Returns the chunk id within the file.
    #[inline]
    #[must_use]
    pub const fn chunk_id(self) -> u32 {
        ((self.0 >> CHUNK_OFFSET) & CHUNK_MASK) as u32
    }

    /// Returns the stored size in 64-byte units.
    #[inline]
    #[must_use]
    pub const fn size_units(self) -> u32 {
        ((self.0 >> SIZE_OFFSET) & SIZE_MASK) as u32
    }

    /// Returns the record size in bytes, rounded up to 64-byte alignment.
    #[inline]
    #[must_use]
    pub const fn size(self) -> u32 {
        self.size_units() << SIZE_SHIFT
    }

    /// Returns false only for the all-ones sentinel.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u64::MAX
    }

    /// Returns true when the size is zero.
    ///
    /// This is independent of [`is_valid`](Self::is_valid): a locator with a
    /// file and chunk but no size is valid and empty at the same time.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.size() == 0
    }

    /// Number of distinct file ids (exclusive upper bound).
    #[must_use]
    pub const fn file_id_limit() -> u32 {
        1 << FILE_BITS
    }

    /// Number of distinct chunk ids per file (exclusive upper bound).
    #[must_use]
    pub const fn chunk_id_limit() -> u32 {
        1 << CHUNK_BITS
    }

    /// Largest encodable record size in bytes (inclusive).
    #[must_use]
    pub const fn size_limit() -> u32 {
        SIZE_LIMIT
    }

    /// Alignment unit for sizes in bytes.
    #[must_use]
    pub const fn alignment() -> u32 {
        ALIGNMENT
    }

    const fn aligned_units(size: u32) -> u64 {
        (size as u64 + (ALIGNMENT as u64 - 1)) >> SIZE_SHIFT
    }

    const fn pack(file_id: u32, chunk_id: u32, size: u32) -> Self {
        Self(
            ((file_id as u64 & FILE_MASK) << FILE_OFFSET)
                | ((chunk_id as u64 & CHUNK_MASK) << CHUNK_OFFSET)
                | ((Self::aligned_units(size) & SIZE_MASK) << SIZE_OFFSET),
        )
    }

    #[inline]
    const fn location_key(self) -> (u32, u32) {
        (self.file_id(), self.chunk_id())
    }
}

impl Default for PackedLocator {
    fn default() -> Self {
        Self::INVALID
    }
}

impl PartialEq for PackedLocator {
    fn eq(&self, other: &Self) -> bool {
        self.location_key() == other.location_key()
    }
}

impl Eq for PackedLocator {}

impl Hash for PackedLocator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location_key().hash(state);
    }
}

impl PartialOrd for PackedLocator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackedLocator {
    fn cmp(&self, other: &Self) -> Ordering {
        self.location_key().cmp(&other.location_key())
    }
}

impl From<u64> for PackedLocator {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<PackedLocator> for u64 {
    fn from(locator: PackedLocator) -> Self {
        locator.as_u64()
    }
}

impl fmt::Debug for PackedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("PackedLocator(INVALID)");
        }
        f.debug_struct("PackedLocator")
            .field("file_id", &self.file_id())
            .field("chunk_id", &self.chunk_id())
            .field("size", &self.size())
            .finish()
    }
}

impl fmt::Display for PackedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}+{}", self.file_id(), self.chunk_id(), self.size())
        } else {
            f.write_str("invalid")
        }
    }
}
