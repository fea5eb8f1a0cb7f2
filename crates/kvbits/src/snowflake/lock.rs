use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Result,
    mutex::Mutex,
    snowflake::{
        GeneratorConfig, Poll, SnowflakeGenerator, TimeSource, WorkerIdSource,
        state::{Reading, State},
    },
};

/// A lock-based Snowflake generator for multi-threaded use.
///
/// The state lives in an [`Arc<Mutex<_>>`]; clones share it and issue ids
/// from one sequence. The critical section is constant-time, and clock and
/// worker-id reads as well as every wait happen outside it.
///
/// ## See Also
/// - [`BasicSnowflakeGenerator`]
///
/// [`BasicSnowflakeGenerator`]: crate::snowflake::BasicSnowflakeGenerator
#[derive(Clone)]
pub struct LockSnowflakeGenerator<T, W> {
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<State>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<State>>,
    config: GeneratorConfig,
    time: T,
    worker: W,
    cancellation: CancellationToken,
}

impl<T, W> LockSnowflakeGenerator<T, W>
where
    T: TimeSource,
    W: WorkerIdSource,
{
    /// Creates a generator with the default configuration.
    ///
    /// # Example
    /// ```
    /// use kvbits::snowflake::{LockSnowflakeGenerator, MonotonicClock, SnowflakeGenerator};
    ///
    /// let generator = LockSnowflakeGenerator::new(0_u64, MonotonicClock::new());
    /// std::thread::scope(|s| {
    ///     for _ in 0..4 {
    ///         s.spawn(|| generator.next_id().unwrap());
    ///     }
    /// });
    /// ```
    pub fn new(worker: W, time: T) -> Self {
        Self::with_config(GeneratorConfig::default(), worker, time)
    }

    pub fn with_config(config: GeneratorConfig, worker: W, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(State::default()))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(State::default())),
            config,
            time,
            worker,
            cancellation: CancellationToken::new(),
        }
    }

    /// Attempts to generate the next id without waiting.
    ///
    /// # Errors
    ///
    /// See [`SnowflakeGenerator::try_poll_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        let worker_id = self.worker.worker_id();
        let now = self.time.current_millis();
        let tick = self.config.layout.tick_of(now)?;

        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };
        state.advance(&self.config, Reading { now, tick, worker_id })
    }
}

impl<T, W> SnowflakeGenerator for LockSnowflakeGenerator<T, W>
where
    T: TimeSource,
    W: WorkerIdSource,
{
    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    fn try_poll_id(&self) -> Result<Poll> {
        self.try_poll_id()
    }
}
