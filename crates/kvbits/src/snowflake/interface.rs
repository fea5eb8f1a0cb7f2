use core::time::Duration;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    snowflake::{GeneratorConfig, Poll, SnowflakeId},
};

/// A minimal interface for generating Snowflake ids.
pub trait SnowflakeGenerator {
    /// Settings the generator was built with.
    fn config(&self) -> &GeneratorConfig;

    /// Token cancelled by [`SnowflakeGenerator::shutdown`].
    fn cancellation(&self) -> &CancellationToken;

    /// Attempts to generate the next id without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::Domain`] if the clock precedes the layout epoch or the
    ///   worker id does not fit its field.
    /// - [`Error::ClockRegression`] if the clock moved backward past the
    ///   tolerated drift.
    /// - `Error::LockPoisoned` if a lock-based generator's mutex is poisoned.
    fn try_poll_id(&self) -> Result<Poll>;

    /// Generates the next id, blocking the calling thread while the current
    /// tick is exhausted.
    ///
    /// Waits in slices of at most one millisecond. Each slice first checks
    /// for shutdown and for the configured `max_wait`.
    ///
    /// # Errors
    ///
    /// Everything [`SnowflakeGenerator::try_poll_id`] returns, plus
    /// [`Error::Interrupted`] after shutdown and [`Error::WaitTimeout`] once
    /// `max_wait` has elapsed.
    fn next_id(&self) -> Result<SnowflakeId> {
        let mut started: Option<Instant> = None;
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => {
                    let waited = started.get_or_insert_with(Instant::now).elapsed();
                    check_wait(self.cancellation(), self.config(), waited)?;
                    let pause = yield_for.min(Duration::from_millis(1));
                    if pause.is_zero() {
                        std::thread::yield_now();
                    } else {
                        std::thread::sleep(pause);
                    }
                }
            }
        }
    }

    /// Stops the generator from waiting. Blocked and future waits fail with
    /// [`Error::Interrupted`]; ids that are immediately available are still
    /// issued.
    fn shutdown(&self) {
        self.cancellation().cancel();
    }

    fn is_shutdown(&self) -> bool {
        self.cancellation().is_cancelled()
    }
}

pub(crate) fn check_wait(
    token: &CancellationToken,
    config: &GeneratorConfig,
    waited: Duration,
) -> Result<()> {
    if token.is_cancelled() {
        return Err(Error::Interrupted);
    }
    if waited >= config.max_wait {
        #[cfg(feature = "tracing")]
        tracing::warn!(?waited, "clock did not advance in time");
        return Err(Error::WaitTimeout { waited });
    }
    Ok(())
}
