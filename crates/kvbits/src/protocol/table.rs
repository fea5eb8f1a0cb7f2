use bytes::Bytes;

use crate::{
    bytes::ByteSeq,
    error::{Error, Result},
    protocol::Keyword,
};

/// Largest integer cached by [`ProtocolTable::new`].
pub const DEFAULT_INTEGER_CACHE: usize = 1024;

/// Upper limit on the cache bound; larger requests are clamped to it.
pub const MAX_INTEGER_CACHE: usize = 65_535;

/// Encoding of `f64::INFINITY`.
pub const POSITIVE_INFINITY: ByteSeq = ByteSeq::from_static(b"+inf");

/// Encoding of `f64::NEG_INFINITY`.
pub const NEGATIVE_INFINITY: ByteSeq = ByteSeq::from_static(b"-inf");

/// Pre-encoded byte sequences for hot protocol constants.
///
/// The table is built once, at construction, and is read-only afterwards.
/// Small non-negative integers (`0..=bound`) are encoded into a single shared
/// buffer; lookups hand out O(1) views into it. Everything else is encoded
/// on demand.
///
/// A table is an ordinary value: create one per client (or share one behind
/// an `Arc`) rather than relying on process-wide state.
///
/// # Example
///
/// ```
/// use kvbits::protocol::{Keyword, ProtocolTable};
///
/// let table = ProtocolTable::new();
/// assert_eq!(table.integer(42), "42");
/// assert_eq!(table.float(f64::NEG_INFINITY).unwrap(), "-inf");
/// assert_eq!(table.keyword(Keyword::Set), "SET");
/// ```
#[derive(Clone, Debug)]
pub struct ProtocolTable {
    integers: Box<[ByteSeq]>,
}

impl Default for ProtocolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolTable {
    /// Builds a table caching `0..=DEFAULT_INTEGER_CACHE`.
    pub fn new() -> Self {
        Self::with_integer_cache(DEFAULT_INTEGER_CACHE)
    }

    /// Builds a table caching `0..=bound`, with `bound` clamped to
    /// [`MAX_INTEGER_CACHE`].
    pub fn with_integer_cache(bound: usize) -> Self {
        let bound = bound.min(MAX_INTEGER_CACHE);
        let mut text = String::new();
        let mut ends = Vec::with_capacity(bound + 1);
        for n in 0..=bound {
            text.push_str(&n.to_string());
            ends.push(text.len());
        }
        let shared = Bytes::from(text);
        let mut start = 0;
        let integers = ends
            .into_iter()
            .map(|end| {
                let seq = ByteSeq::from_bytes(shared.slice(start..end));
                start = end;
                seq
            })
            .collect();
        Self { integers }
    }

    /// The largest cached integer.
    pub fn integer_cache_bound(&self) -> usize {
        self.integers.len() - 1
    }

    /// Decimal encoding of `n`.
    pub fn integer(&self, n: i64) -> ByteSeq {
        match usize::try_from(n).ok().and_then(|i| self.integers.get(i)) {
            Some(cached) => cached.clone(),
            None => ByteSeq::from_vec(n.to_string().into_bytes()),
        }
    }

    /// Decimal encoding of `n`.
    pub fn unsigned(&self, n: u64) -> ByteSeq {
        match usize::try_from(n).ok().and_then(|i| self.integers.get(i)) {
            Some(cached) => cached.clone(),
            None => ByteSeq::from_vec(n.to_string().into_bytes()),
        }
    }

    /// Encodes `value` the way sorted-set scores are written.
    ///
    /// Infinities map to [`POSITIVE_INFINITY`] / [`NEGATIVE_INFINITY`],
    /// negative zero to `-0`, integral values to their integer form, and
    /// everything else to the shortest decimal that round-trips.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for NaN.
    pub fn float(&self, value: f64) -> Result<ByteSeq> {
        if value.is_nan() {
            return Err(Error::InvalidArgument {
                reason: "NaN has no protocol encoding".to_owned(),
            });
        }
        if value.is_infinite() {
            return Ok(if value > 0.0 {
                POSITIVE_INFINITY
            } else {
                NEGATIVE_INFINITY
            });
        }
        if value == 0.0 && value.is_sign_negative() {
            return Ok(ByteSeq::from_static(b"-0"));
        }
        if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
            // Exact: |value| < 2^53.
            #[allow(clippy::cast_possible_truncation)]
            return Ok(self.integer(value as i64));
        }
        Ok(ByteSeq::from_vec(value.to_string().into_bytes()))
    }

    /// The static encoding of `keyword`.
    pub const fn keyword(&self, keyword: Keyword) -> ByteSeq {
        keyword.seq()
    }
}
