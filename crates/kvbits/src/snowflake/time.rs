use core::time::Duration;
use std::{
    sync::Arc,
    thread,
    time::{Instant, SystemTime},
};

use portable_atomic::{AtomicU64, Ordering};

/// Unix epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const UNIX_EPOCH: Duration = Duration::from_millis(0);

/// Y2K epoch: Saturday, January 1, 2000 00:00:00 UTC
pub const Y2K_EPOCH: Duration = Duration::from_millis(946_684_800_000);

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// A source of wall-clock readings.
///
/// Readings are **milliseconds since the Unix epoch**; the generator converts
/// them to ticks relative to the layout epoch. Plug in a real clock, a
/// monotonic clock, or a mock in tests. Any `Fn() -> u64` is a time source.
///
/// # Example
///
/// ```
/// use kvbits::snowflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// assert_eq!((|| 42_u64).current_millis(), 42);
/// ```
pub trait TimeSource {
    /// Milliseconds since 1970-01-01T00:00:00Z.
    fn current_millis(&self) -> u64;
}

impl<F> TimeSource for F
where
    F: Fn() -> u64,
{
    fn current_millis(&self) -> u64 {
        self()
    }
}

/// Reads `SystemTime::now()` on every call.
///
/// Follows wall-clock adjustments, so it can move backward; the generator
/// tolerates small regressions and rejects large ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        unix_millis()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Shared ticker state updated once per millisecond.
#[derive(Debug)]
struct Ticker {
    elapsed: AtomicU64,
}

/// A time source that never goes backward.
///
/// The clock captures the wall-clock time once, at construction, and from
/// then on advances with a monotonic timer. A background thread stores the
/// elapsed milliseconds in an atomic so that reads avoid a syscall. The
/// thread exits once every clone of the clock has been dropped.
///
/// # Example
///
/// ```
/// use kvbits::snowflake::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::new();
/// let a = clock.current_millis();
/// std::thread::sleep(std::time::Duration::from_millis(5));
/// assert!(clock.current_millis() >= a);
/// ```
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    ticker: Arc<Ticker>,
    anchor: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock at the current wall-clock time.
    pub fn new() -> Self {
        Self::with_anchor(unix_millis())
    }

    /// Anchors a new clock at `anchor` milliseconds since the Unix epoch.
    pub fn with_anchor(anchor: u64) -> Self {
        let start = Instant::now();
        let ticker = Arc::new(Ticker {
            elapsed: AtomicU64::new(0),
        });

        let weak = Arc::downgrade(&ticker);
        thread::spawn(move || {
            let mut tick = 0;
            loop {
                let Some(ticker) = weak.upgrade() else {
                    break;
                };

                let target = start + Duration::from_millis(tick);
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                ticker.elapsed.store(now_ms, Ordering::Relaxed);
                tick = now_ms + 1;
            }
        });

        Self { ticker, anchor }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.anchor + self.ticker.elapsed.load(Ordering::Relaxed)
    }
}
