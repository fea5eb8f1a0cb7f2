use core::time::Duration;

use crate::{
    error::{Error, Field, Result},
    snowflake::{CUSTOM_EPOCH, SnowflakeId},
};

/// Length of one timestamp tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TimeUnit {
    Millis,
    Seconds,
}

impl TimeUnit {
    pub const fn millis_per_tick(self) -> u64 {
        match self {
            Self::Millis => 1,
            Self::Seconds => 1_000,
        }
    }
}

/// Bit partition of a Snowflake id, MSB to LSB: timestamp, worker id,
/// sequence. Unused high bits stay zero.
///
/// ```text
/// LAYOUT_64:
///  +--------------+----------------+----------------+---------------+
///  | reserved (1) | timestamp (41) | worker id (10) | sequence (12) |
///  +--------------+----------------+----------------+---------------+
///
/// LAYOUT_52 (second ticks):
///  +---------------+----------------+---------------+---------------+
///  | reserved (12) | timestamp (36) | worker id (6) | sequence (10) |
///  +---------------+----------------+---------------+---------------+
/// ```
///
/// Field values are validated against their width on every encode; nothing
/// is silently masked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LayoutRepr", into = "LayoutRepr"))]
pub struct SnowflakeLayout {
    timestamp_bits: u8,
    worker_bits: u8,
    sequence_bits: u8,
    unit: TimeUnit,
    epoch: Duration,
}

/// 41-bit millisecond timestamp, 10-bit worker id, 12-bit sequence.
pub const LAYOUT_64: SnowflakeLayout = SnowflakeLayout {
    timestamp_bits: 41,
    worker_bits: 10,
    sequence_bits: 12,
    unit: TimeUnit::Millis,
    epoch: CUSTOM_EPOCH,
};

/// 36-bit second timestamp, 6-bit worker id, 10-bit sequence. Fits in the
/// integer range of an IEEE-754 double.
pub const LAYOUT_52: SnowflakeLayout = SnowflakeLayout {
    timestamp_bits: 36,
    worker_bits: 6,
    sequence_bits: 10,
    unit: TimeUnit::Seconds,
    epoch: CUSTOM_EPOCH,
};

impl Default for SnowflakeLayout {
    fn default() -> Self {
        LAYOUT_64
    }
}

/// The fields of a decoded id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SnowflakeParts {
    /// Ticks since the layout epoch.
    pub timestamp: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

const fn mask(bits: u8) -> u64 {
    (1 << bits) - 1
}

impl SnowflakeLayout {
    /// Validates and builds a layout.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLayout`] if any field has zero width or the widths sum
    /// past 63 bits.
    pub fn new(
        timestamp_bits: u8,
        worker_bits: u8,
        sequence_bits: u8,
        unit: TimeUnit,
        epoch: Duration,
    ) -> Result<Self> {
        if timestamp_bits == 0 || worker_bits == 0 || sequence_bits == 0 {
            return Err(Error::InvalidLayout {
                reason: "every field needs at least one bit".to_owned(),
            });
        }
        let total = u32::from(timestamp_bits) + u32::from(worker_bits) + u32::from(sequence_bits);
        if total > 63 {
            return Err(Error::InvalidLayout {
                reason: format!("{total} bits do not fit in a positive i64"),
            });
        }
        Ok(Self {
            timestamp_bits,
            worker_bits,
            sequence_bits,
            unit,
            epoch,
        })
    }

    /// The same layout anchored at `epoch` (a duration since the Unix epoch).
    #[must_use]
    pub const fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    pub const fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    pub const fn worker_bits(&self) -> u8 {
        self.worker_bits
    }

    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits)
    }

    pub const fn max_worker_id(&self) -> u64 {
        mask(self.worker_bits)
    }

    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    const fn worker_shift(&self) -> u8 {
        self.sequence_bits
    }

    const fn timestamp_shift(&self) -> u8 {
        self.sequence_bits + self.worker_bits
    }

    fn epoch_millis(&self) -> u64 {
        u64::try_from(self.epoch.as_millis()).unwrap_or(u64::MAX)
    }

    /// Packs the fields into an id.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] naming the first field that exceeds its width.
    pub fn encode(&self, timestamp: u64, worker_id: u64, sequence: u64) -> Result<SnowflakeId> {
        check(Field::Timestamp, timestamp, self.max_timestamp())?;
        check(Field::WorkerId, worker_id, self.max_worker_id())?;
        check(Field::Sequence, sequence, self.max_sequence())?;
        Ok(SnowflakeId::from_raw(
            (timestamp << self.timestamp_shift()) | (worker_id << self.worker_shift()) | sequence,
        ))
    }

    /// Splits an id into its fields. Bits above the layout are ignored.
    pub const fn decode(&self, id: SnowflakeId) -> SnowflakeParts {
        let raw = id.to_raw();
        SnowflakeParts {
            timestamp: (raw >> self.timestamp_shift()) & self.max_timestamp(),
            worker_id: (raw >> self.worker_shift()) & self.max_worker_id(),
            sequence: raw & self.max_sequence(),
        }
    }

    /// Wall-clock time at which `id` was issued, truncated to its tick, as a
    /// duration since the Unix epoch.
    pub fn timestamp_of(&self, id: SnowflakeId) -> Duration {
        let ticks = self.decode(id).timestamp;
        self.epoch + Duration::from_millis(ticks * self.unit.millis_per_tick())
    }

    /// Converts a clock reading (millis since the Unix epoch) to a tick.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] if the reading precedes the epoch or the tick does
    /// not fit the timestamp field.
    pub fn tick_of(&self, unix_millis: u64) -> Result<u64> {
        let epoch = self.epoch_millis();
        if unix_millis < epoch {
            return Err(Error::Domain {
                field: Field::Timestamp,
                value: i128::from(unix_millis) - i128::from(epoch),
                max: self.max_timestamp(),
            });
        }
        let tick = (unix_millis - epoch) / self.unit.millis_per_tick();
        check(Field::Timestamp, tick, self.max_timestamp())?;
        Ok(tick)
    }

    /// Milliseconds from `unix_millis` until `tick` begins, at least one.
    pub(crate) fn millis_until_tick(&self, tick: u64, unix_millis: u64) -> u64 {
        let start = self.epoch_millis() + tick * self.unit.millis_per_tick();
        start.saturating_sub(unix_millis).max(1)
    }
}

fn check(field: Field, value: u64, max: u64) -> Result<()> {
    if value > max {
        return Err(Error::Domain {
            field,
            value: i128::from(value),
            max,
        });
    }
    Ok(())
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct LayoutRepr {
    timestamp_bits: u8,
    worker_bits: u8,
    sequence_bits: u8,
    unit: TimeUnit,
    #[serde(rename = "epoch_ms", with = "crate::snowflake::millis")]
    epoch: Duration,
}

#[cfg(feature = "serde")]
impl TryFrom<LayoutRepr> for SnowflakeLayout {
    type Error = Error;

    fn try_from(repr: LayoutRepr) -> Result<Self> {
        Self::new(
            repr.timestamp_bits,
            repr.worker_bits,
            repr.sequence_bits,
            repr.unit,
            repr.epoch,
        )
    }
}

#[cfg(feature = "serde")]
impl From<SnowflakeLayout> for LayoutRepr {
    fn from(layout: SnowflakeLayout) -> Self {
        Self {
            timestamp_bits: layout.timestamp_bits,
            worker_bits: layout.worker_bits,
            sequence_bits: layout.sequence_bits,
            unit: layout.unit,
            epoch: layout.epoch,
        }
    }
}
