//! Recent badge reads.

use std::sync::Arc;
use std::time::Duration;

use accesswatch_types::{AccessStatus, Event};
use async_trait::async_trait;
use tokio::sync::watch;

use super::{Fetch, PollState, PollingSource};
use crate::transport::{fetch_json, Transport, TransportError};

/// Resource path of the event log.
pub const TRANSACTIONS_PATH: &str = "/transactions";

/// Number of events requested when no limit is given.
pub const DEFAULT_LIMIT: u32 = 100;

/// How often the event log is refreshed.
pub const TRANSACTIONS_INTERVAL: Duration = Duration::from_millis(5000);

/// Parameters for an event log request.
///
/// The filters are applied by the server; the client never filters or
/// reorders what comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Maximum number of events, most recent first.
    pub limit: u32,
    /// Only events with this outcome.
    pub status: Option<AccessStatus>,
    /// Only events for this badge.
    pub uid: Option<String>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            status: None,
            uid: None,
        }
    }
}

impl TransactionQuery {
    /// Query for the `limit` most recent events.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Query string parameters.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", self.limit.to_string())];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(ref uid) = self.uid {
            params.push(("uid", uid.clone()));
        }
        params
    }
}

/// Fetch the most recent events, in the order the server returns them.
pub async fn fetch_transactions(
    transport: &dyn Transport,
    query: &TransactionQuery,
) -> Result<Vec<Event>, TransportError> {
    fetch_json(transport, TRANSACTIONS_PATH, &query.params()).await
}

/// The fetch behind a [`TransactionFeed`].
#[derive(Debug)]
pub struct TransactionsRequest {
    transport: Arc<dyn Transport>,
    query: TransactionQuery,
}

impl TransactionsRequest {
    /// The query sent on every poll.
    pub fn query(&self) -> &TransactionQuery {
        &self.query
    }
}

#[async_trait]
impl Fetch for TransactionsRequest {
    type Output = Vec<Event>;

    async fn fetch(&self) -> Result<Vec<Event>, TransportError> {
        fetch_transactions(self.transport.as_ref(), &self.query).await
    }
}

/// Live view of the most recent events.
///
/// Each successful poll replaces the whole list. There is no client-side
/// merge or dedup across polls: the server decides what "recent" means.
#[derive(Debug)]
pub struct TransactionFeed {
    source: PollingSource<TransactionsRequest>,
}

impl TransactionFeed {
    /// Create an idle feed polling every [`TRANSACTIONS_INTERVAL`].
    pub fn new(transport: Arc<dyn Transport>, query: TransactionQuery) -> Self {
        Self::with_interval(transport, query, TRANSACTIONS_INTERVAL)
    }

    /// Create an idle feed with a custom interval.
    pub fn with_interval(
        transport: Arc<dyn Transport>,
        query: TransactionQuery,
        interval: Duration,
    ) -> Self {
        let request = TransactionsRequest { transport, query };
        Self {
            source: PollingSource::new("transactions", request, interval),
        }
    }

    /// The query sent on every poll.
    pub fn query(&self) -> &TransactionQuery {
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
    pub fn subscribe(&self) -> watch::Receiver<PollState<Vec<Event>>> {
        self.source.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState<Vec<Event>> {
        self.source.state()
    }

    /// The underlying polling source.
    pub fn source(&self) -> &PollingSource<TransactionsRequest> {
        &self.source
    }
}
