use core::fmt;

/// A packed Snowflake identifier.
///
/// The value carries no layout; use [`SnowflakeLayout::decode`] to split it
/// into its fields. Ids from one generator order by issue time.
///
/// [`SnowflakeLayout::decode`]: crate::snowflake::SnowflakeLayout::decode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct SnowflakeId(u64);

impl SnowflakeId {
    /// Number of decimal digits in `u64::MAX`.
    pub const PADDED_LEN: usize = 20;

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Zero-padded decimal form. Padded strings sort like the ids.
    pub fn to_padded_string(self) -> String {
        format!("{:0width$}", self.0, width = Self::PADDED_LEN)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.0
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
