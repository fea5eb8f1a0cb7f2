use core::time::Duration;

use crate::snowflake::SnowflakeLayout;

/// Default tolerated backward clock movement.
pub const DEFAULT_MAX_CLOCK_DRIFT: Duration = Duration::from_millis(10);

/// Default bound on how long a blocking call waits for the clock.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5);

/// Generator settings.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use kvbits::snowflake::{GeneratorConfig, LAYOUT_52};
///
/// let config = GeneratorConfig::new(LAYOUT_52)
///     .with_max_clock_drift(Duration::from_millis(50))
///     .with_max_wait(Duration::from_secs(1));
/// assert_eq!(config.layout, LAYOUT_52);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneratorConfig {
    /// Bit layout and epoch of issued ids.
    pub layout: SnowflakeLayout,
    /// A clock reading more than this far behind the latest reading fails
    /// with [`ClockRegression`]; smaller regressions wait it out.
    ///
    /// [`ClockRegression`]: crate::Error::ClockRegression
    #[cfg_attr(feature = "serde", serde(rename = "max_clock_drift_ms", with = "crate::snowflake::millis"))]
    pub max_clock_drift: Duration,
    /// Upper bound on the time `next_id` spends waiting for the clock.
    #[cfg_attr(feature = "serde", serde(rename = "max_wait_ms", with = "crate::snowflake::millis"))]
    pub max_wait: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(SnowflakeLayout::default())
    }
}

impl GeneratorConfig {
    pub const fn new(layout: SnowflakeLayout) -> Self {
        Self {
            layout,
            max_clock_drift: DEFAULT_MAX_CLOCK_DRIFT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: SnowflakeLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub const fn with_max_clock_drift(mut self, drift: Duration) -> Self {
        self.max_clock_drift = drift;
        self
    }

    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub(crate) fn max_clock_drift_millis(&self) -> u64 {
        u64::try_from(self.max_clock_drift.as_millis()).unwrap_or(u64::MAX)
    }
}
