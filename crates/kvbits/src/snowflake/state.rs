use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    snowflake::{GeneratorConfig, Poll},
};

/// Everything a generator remembers between calls. All fields change
/// together under one lock (or one `Cell` write).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct State {
    issued: bool,
    tick: u64,
    worker_id: u64,
    sequence: u64,
    /// Largest clock reading seen, in millis since the Unix epoch.
    high_water: u64,
}

/// Clock and worker readings taken before entering the critical section.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Reading {
    pub(crate) now: u64,
    pub(crate) tick: u64,
    pub(crate) worker_id: u64,
}

impl State {
    /// Advances the state for one request. On error or `Pending` the state
    /// is left untouched.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, config)))]
    pub(crate) fn advance(&mut self, config: &GeneratorConfig, reading: Reading) -> Result<Poll> {
        let layout = &config.layout;
        if self.issued && reading.now.saturating_add(config.max_clock_drift_millis()) < self.high_water {
            return Err(Self::cold_clock_regression(self.high_water, reading.now));
        }

        let mut next = *self;
        if self.issued && reading.worker_id != self.worker_id && reading.tick <= self.tick {
            // Ticks up to `self.tick` may already carry ids for the new worker.
            return Ok(Self::cold_clock_behind(
                layout.millis_until_tick(self.tick + 1, reading.now),
            ));
        }
        if !self.issued || reading.worker_id != self.worker_id || reading.tick > self.tick {
            next.tick = reading.tick;
            next.worker_id = reading.worker_id;
            next.sequence = 0;
        } else if reading.tick == self.tick {
            if self.sequence >= layout.max_sequence() {
                let wait = layout.millis_until_tick(self.tick + 1, reading.now);
                return Ok(Poll::Pending {
                    yield_for: Duration::from_millis(wait),
                });
            }
            next.sequence += 1;
        } else {
            return Ok(Self::cold_clock_behind(
                layout.millis_until_tick(self.tick, reading.now),
            ));
        }

        let id = layout.encode(next.tick, next.worker_id, next.sequence)?;
        next.issued = true;
        next.high_water = self.high_water.max(reading.now);
        *self = next;
        Ok(Poll::Ready { id })
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(wait_millis: u64) -> Poll {
        Poll::Pending {
            yield_for: Duration::from_millis(wait_millis),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_regression(high_water: u64, now: u64) -> Error {
        let behind = Duration::from_millis(high_water - now);
        #[cfg(feature = "tracing")]
        tracing::warn!(?behind, "clock moved backward past tolerated drift");
        Error::ClockRegression { behind }
    }
}
