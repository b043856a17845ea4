//! Windowed pass/fail statistics.

use std::sync::Arc;
use std::time::Duration;

use accesswatch_types::StatsSnapshot;
use async_trait::async_trait;
use tokio::sync::watch;

use super::{Fetch, PollState, PollingSource};
use crate::transport::{fetch_json, Transport, TransportError};

/// Resource path of the statistics endpoint.
pub const STATS_PATH: &str = "/stats";

/// Window length requested when none is given.
pub const DEFAULT_HOURS: u32 = 24;

/// How often statistics are refreshed.
pub const STATS_INTERVAL: Duration = Duration::from_millis(10000);

/// Parameters for a statistics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsQuery {
    /// Window length ending now, in hours.
    pub hours: u32,
}

impl Default for StatsQuery {
    fn default() -> Self {
        Self {
            hours: DEFAULT_HOURS,
        }
    }
}

impl StatsQuery {
    /// Query string parameters.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![("hours", self.hours.to_string())]
    }
}

/// Fetch the aggregated window exactly as the server computed it.
pub async fn fetch_stats(
    transport: &dyn Transport,
    query: StatsQuery,
) -> Result<StatsSnapshot, TransportError> {
    fetch_json(transport, STATS_PATH, &query.params()).await
}

/// The fetch behind a [`StatsAggregator`].
#[derive(Debug)]
pub struct StatsRequest {
    transport: Arc<dyn Transport>,
    query: StatsQuery,
}

impl StatsRequest {
    /// The query sent on every poll.
    pub fn query(&self) -> StatsQuery {
        self.query
    }
}

#[async_trait]
impl Fetch for StatsRequest {
    type Output = StatsSnapshot;

    async fn fetch(&self) -> Result<StatsSnapshot, TransportError> {
        fetch_stats(self.transport.as_ref(), self.query).await
    }
}

/// Live view of the statistics window.
///
/// Each successful poll replaces the whole snapshot; totals are displayed
/// as the server reports them and never recomputed from the timeline.
#[derive(Debug)]
pub struct StatsAggregator {
    source: PollingSource<StatsRequest>,
}

impl StatsAggregator {
    /// Create an idle aggregator polling every [`STATS_INTERVAL`].
    pub fn new(transport: Arc<dyn Transport>, query: StatsQuery) -> Self {
        Self::with_interval(transport, query, STATS_INTERVAL)
    }

    /// Create an idle aggregator with a custom interval.
    pub fn with_interval(
        transport: Arc<dyn Transport>,
        query: StatsQuery,
        interval: Duration,
    ) -> Self {
        let request = StatsRequest { transport, query };
        Self {
            source: PollingSource::new("stats", request, interval),
        }
    }

    /// The query sent on every poll.
    pub fn query(&self) -> StatsQuery {
        self.source.fetcher().query()
    }

    /// Begin polling.
    pub fn start(&mut self) -> bool {
        self.source.start()
    }

    /// Begin a new generation.
    pub fn restart(&mut self) -> bool {
        self.source.restart()
    }

    /// Fetch once now.
    pub fn refresh(&self) -> bool {
        self.source.refresh()
    }

    /// Stop polling.
    pub fn stop(&mut self) {
        self.source.stop()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PollState<StatsSnapshot>> {
        self.source.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState<StatsSnapshot> {
        self.source.state()
    }

    /// The underlying polling source.
    pub fn source(&self) -> &PollingSource<StatsRequest> {
        &self.source
    }
}
