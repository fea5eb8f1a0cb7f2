use core::time::Duration;

use crate::snowflake::SnowflakeId;

/// Outcome of a non-blocking attempt to generate an id.
///
/// - [`Poll::Ready`]: a new id was issued.
/// - [`Poll::Pending`]: the current tick is exhausted, or the clock is
///   slightly behind the last issued id. Retry after `yield_for`.
///
/// # Example
///
/// ```
/// use kvbits::snowflake::{BasicSnowflakeGenerator, Poll};
///
/// let generator = BasicSnowflakeGenerator::new(7_u64, || 1_800_000_000_000_u64);
/// match generator.try_poll_id().unwrap() {
///     Poll::Ready { id } => println!("id: {id}"),
///     Poll::Pending { yield_for } => println!("back off for {yield_for:?}"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique id was generated.
    Ready {
        /// The generated id.
        id: SnowflakeId,
    },
    /// No id can be issued yet.
    Pending {
        /// How long until the next attempt can succeed.
        yield_for: Duration,
    },
}

impl Poll {
    /// Returns the id if ready.
    pub const fn ready(self) -> Option<SnowflakeId> {
        match self {
            Self::Ready { id } => Some(id),
            Self::Pending { .. } => None,
        }
    }
}
