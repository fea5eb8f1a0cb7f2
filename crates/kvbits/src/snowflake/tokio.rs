use core::{pin::Pin, time::Duration};
use std::time::Instant;

use crate::{
    error::Result,
    snowflake::{Poll, SnowflakeGenerator, SnowflakeId, interface::check_wait},
};

/// Abstracts how to wait for a [`Duration`] in async contexts.
pub trait SleepProvider {
    type Sleep: Future<Output = ()>;

    fn sleep_for(dur: Duration) -> Self::Sleep;
}

/// Waits with Tokio's timer.
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    type Sleep = tokio::time::Sleep;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        tokio::time::sleep(dur)
    }
}

/// Yields to the Tokio scheduler instead of arming a timer.
///
/// Lower latency at low concurrency, at the cost of tighter polling loops
/// under load.
pub struct TokioYield;
impl SleepProvider for TokioYield {
    /// `yield_now()` returns a private future type.
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep_for(_dur: Duration) -> Self::Sleep {
        Box::pin(tokio::task::yield_now())
    }
}

/// Extension trait for generating ids without blocking a Tokio worker.
pub trait SnowflakeGeneratorAsyncExt {
    /// Resolves to the next id, sleeping with [`TokioSleep`] while the
    /// current tick is exhausted.
    ///
    /// # Errors
    ///
    /// Same as [`SnowflakeGenerator::next_id`].
    fn next_id_async(&self) -> impl Future<Output = Result<SnowflakeId>>;

    /// Like [`SnowflakeGeneratorAsyncExt::next_id_async`] with an explicit
    /// wait strategy.
    ///
    /// # Errors
    ///
    /// Same as [`SnowflakeGenerator::next_id`].
    fn next_id_async_with<S: SleepProvider>(&self) -> impl Future<Output = Result<SnowflakeId>>;
}

impl<G> SnowflakeGeneratorAsyncExt for G
where
    G: SnowflakeGenerator,
{
    fn next_id_async(&self) -> impl Future<Output = Result<SnowflakeId>> {
        self.next_id_async_with::<TokioSleep>()
    }

    fn next_id_async_with<S: SleepProvider>(&self) -> impl Future<Output = Result<SnowflakeId>> {
        async move {
            let mut started: Option<Instant> = None;
            loop {
                match self.try_poll_id()? {
                    Poll::Ready { id } => break Ok(id),
                    Poll::Pending { yield_for } => {
                        let waited = started.get_or_insert_with(Instant::now).elapsed();
                        check_wait(self.cancellation(), self.config(), waited)?;
                        S::sleep_for(yield_for.min(Duration::from_millis(1))).await;
                    }
                }
            }
        }
    }
}
