//! Error types shared by every `kvbits` component.
//!
//! ## Error Cases
//! - `OutOfBounds`: an index or sub-range outside a [`ByteSeq`].
//! - `LengthOverflow`: a concatenation longer than `usize::MAX`.
//! - `UnsupportedRepresentation`: direct array access on a sequence that has
//!   no contiguous backing array.
//! - `InvalidArgument`: a value the protocol table cannot encode.
//! - `InvalidLayout`: a Snowflake bit layout that cannot be packed.
//! - `Domain`: a Snowflake field outside its configured bit width.
//! - `ClockRegression`: the clock moved backward past the tolerated drift.
//! - `Interrupted` / `WaitTimeout`: the wait for the next tick was cancelled
//!   or exceeded its bound.
//!
//! Bounds, representation and domain errors are defects at the call site and
//! are never retried internally.
//!
//! [`ByteSeq`]: crate::bytes::ByteSeq

use core::{fmt, time::Duration};

/// A result type defaulting to the crate [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Boxed error returned by queue consumers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The Snowflake field that failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    WorkerId,
    Sequence,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timestamp => "timestamp",
            Self::WorkerId => "worker id",
            Self::Sequence => "sequence",
        })
    }
}

/// All error variants that `kvbits` can emit.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An index or range fell outside the sequence.
    #[error("range {start}..{end} out of bounds for length {len}")]
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// Concatenation would produce a sequence longer than `usize::MAX`.
    #[error("concatenated length {head} + {tail} overflows usize")]
    LengthOverflow { head: usize, tail: usize },

    /// Direct array access was requested on a sequence without one. Check
    /// `has_array()` first.
    #[error("sequence has no contiguous backing array")]
    UnsupportedRepresentation,

    /// A value could not be encoded.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The bit widths of a Snowflake layout are unusable.
    #[error("invalid layout: {reason}")]
    InvalidLayout { reason: String },

    /// A Snowflake field exceeded its bit width, or the clock reads earlier
    /// than the layout epoch.
    #[error("{field} value {value} outside 0..={max}")]
    Domain { field: Field, value: i128, max: u64 },

    /// The clock moved backward by more than the tolerated drift.
    #[error("clock moved backward by {behind:?}")]
    ClockRegression { behind: Duration },

    /// The generator was shut down while waiting for the clock.
    #[error("generator shut down while waiting for the next tick")]
    Interrupted,

    /// The clock did not advance within the configured wait bound.
    #[error("clock did not advance within {waited:?}")]
    WaitTimeout { waited: Duration },

    /// A thread panicked while holding the generator lock.
    ///
    /// Not available with the `parking-lot` feature, whose mutexes do not
    /// poison.
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

impl Error {
    pub(crate) const fn out_of_bounds(start: usize, end: usize, len: usize) -> Self {
        Self::OutOfBounds { start, end, len }
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
