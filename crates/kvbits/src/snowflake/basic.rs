use core::cell::Cell;

#[cfg(feature = "tracing")]
use tracing::instrument;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Result,
    snowflake::{
        GeneratorConfig, Poll, SnowflakeGenerator, TimeSource, WorkerIdSource,
        state::{Reading, State},
    },
};

/// A non-concurrent Snowflake generator for single-threaded use.
///
/// Lightweight and lock-free, but **not thread-safe** (`!Sync`).
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::snowflake::LockSnowflakeGenerator
pub struct BasicSnowflakeGenerator<T, W> {
    state: Cell<State>,
    config: GeneratorConfig,
    time: T,
    worker: W,
    cancellation: CancellationToken,
}

impl<T, W> BasicSnowflakeGenerator<T, W>
where
    T: TimeSource,
    W: WorkerIdSource,
{
    /// Creates a generator with the default configuration.
    ///
    /// # Example
    /// ```
    /// use kvbits::snowflake::{BasicSnowflakeGenerator, SnowflakeGenerator, SystemClock};
    ///
    /// let generator = BasicSnowflakeGenerator::new(1_u64, SystemClock);
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(a < b);
    /// ```
    pub fn new(worker: W, time: T) -> Self {
        Self::with_config(GeneratorConfig::default(), worker, time)
    }

    pub fn with_config(config: GeneratorConfig, worker: W, time: T) -> Self {
        Self {
            state: Cell::new(State::default()),
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

        let mut state = self.state.get();
        let poll = state.advance(&self.config, Reading { now, tick, worker_id })?;
        self.state.set(state);
        Ok(poll)
    }
}

impl<T, W> SnowflakeGenerator for BasicSnowflakeGenerator<T, W>
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
