//! Notification-driven queue polling.
//!
//! A [`PollingTask`] pairs a [`WorkQueue`] with a [`Consumer`]. Ready
//! signals (typically keyspace notifications delivered through a
//! [`KeyspaceWatcher`]) schedule drains on an [`Executor`]; at most one drain
//! runs at a time and no signal is lost.

mod consumer;
mod executor;
mod notify;
mod queue;
mod state;
mod task;
#[cfg(test)]
mod tests;
mod watcher;

pub use consumer::*;
pub use executor::*;
pub use notify::*;
pub use queue::*;
pub(crate) use state::StateCell;
pub use state::TaskState;
pub use task::*;
pub use watcher::*;
