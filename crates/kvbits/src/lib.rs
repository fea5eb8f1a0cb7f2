//! Low-level building blocks for key-value store clients.
//!
//! - [`bytes`]: immutable byte sequences with zero-copy views, ropes and
//!   charset-aware decoding.
//! - [`protocol`]: pre-encoded keywords, integers and float sentinels.
//! - [`snowflake`]: time-ordered 64-bit and 52-bit id generation.
//! - [`polling`]: notification-driven, non-overlapping queue drains.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bytes;
mod error;
mod mutex;
pub mod polling;
pub mod protocol;
pub mod snowflake;

pub use crate::error::*;
