//! Snowflake id generation.
//!
//! Ids pack `(timestamp, worker id, sequence)` into a `u64` according to a
//! [`SnowflakeLayout`]. For one worker id, successive ids strictly increase,
//! including across sequence exhaustion and small backward clock steps.

mod basic;
mod config;
mod id;
mod interface;
mod layout;
mod lock;
#[cfg(feature = "serde")]
mod millis;
mod state;
mod status;
mod time;
#[cfg(feature = "async-tokio")]
mod tokio;
mod worker;

pub use basic::*;
pub use config::*;
pub use id::*;
pub use interface::*;
pub use layout::*;
pub use lock::*;
pub use status::*;
pub use time::*;
#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
pub use tokio::*;
pub use worker::*;
