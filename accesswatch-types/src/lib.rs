//! # accesswatch-types
//!
//! Wire types for an access-control event backend. Badge readers post
//! decisions to the backend; monitoring tools read them back as a recent
//! event log and as windowed pass/fail statistics.
//!
//! ## Features
//!
//! - `serde`: JSON (de)serialization matching the backend's wire format
//!
//! ## Example
//!
//! ```rust
//! use accesswatch_types::{AccessStatus, Bucket, StatsSnapshot};
//! use std::collections::BTreeMap;
//!
//! let mut total = BTreeMap::new();
//! total.insert(AccessStatus::Granted, 10);
//! total.insert(AccessStatus::Denied, 5);
//!
//! let stats = StatsSnapshot {
//!     since: 1_234_567_890,
//!     now: 1_234_571_490,
//!     total,
//!     timeline: vec![Bucket { t: 1_234_567_890, granted: 5, denied: 2 }],
//! };
//!
//! assert_eq!(stats.total_for(AccessStatus::Denied), 5);
//! assert_eq!(stats.window_secs(), 3600);
//! ```

mod event;
mod stats;
#[cfg(feature = "serde")]
mod timestamp;

pub use event::*;
pub use stats::*;
