//! Polling sources that keep the view's data fresh.
//!
//! A [`PollingSource`] turns a single-shot [`Fetch`] into a continuously
//! refreshing [`PollState`]. The two feeds the dashboard shows are thin
//! specializations of it:
//!
//! - [`TransactionFeed`]: the most recent badge reads, every 5 seconds
//! - [`StatsAggregator`]: windowed pass/fail counters, every 10 seconds
//!
//! ```text
//!   tick ──▶ capture generation g ──▶ fetch (async) ──▶ completion
//!                                                        │
//!                       g == current && Running? ──no──▶ drop
//!                                  │yes
//!                                  ▼
//!                     update PollState ──▶ notify subscribers
//! ```

mod polling;
mod stats;
mod transactions;

pub use polling::{Phase, PollState, PollingSource};
pub use stats::{
    fetch_stats, StatsAggregator, StatsQuery, StatsRequest, DEFAULT_HOURS, STATS_INTERVAL,
    STATS_PATH,
};
pub use transactions::{
    fetch_transactions, TransactionFeed, TransactionQuery, TransactionsRequest, DEFAULT_LIMIT,
    TRANSACTIONS_INTERVAL, TRANSACTIONS_PATH,
};

use async_trait::async_trait;

use crate::transport::TransportError;

/// A single-shot fetch that a [`PollingSource`] repeats on a timer.
///
/// Implementations should be cheap to call repeatedly; the engine may have
/// several calls outstanding at once when the backend is slower than the
/// polling interval.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// The value produced by a successful fetch.
    type Output: Clone + Send + Sync + 'static;

    /// Perform one fetch.
    async fn fetch(&self) -> Result<Self::Output, TransportError>;
}
