//! Request/response transport to the access-control backend.
//!
//! The polling layer never talks HTTP directly. It goes through the
//! [`Transport`] trait so the engine and the feeds can be driven by an
//! in-memory transport in tests and by [`HttpTransport`] in the binary.

mod error;
mod http;

pub use error::TransportError;
pub use http::{HttpTransport, HttpTransportBuilder};

use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Path of the backend health probe.
pub const HEALTH_PATH: &str = "/health";

/// One request/response round trip for a named resource.
///
/// Implementations must return `Err` for any non-success response and must
/// not hand back partial data.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Fetch `path` with the given query parameters and return the JSON body.
    async fn fetch_resource(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, TransportError>;

    /// Returns a human-readable description of the backend.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;
}

/// Fetch a resource and decode it as `T`.
///
/// A body that does not match `T` is reported as
/// [`TransportError::Decode`], the same way a failed request is.
pub async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    path: &str,
    query: &[(&str, String)],
) -> Result<T, TransportError> {
    let value = transport.fetch_resource(path, query).await?;
    serde_json::from_value(value).map_err(|e| TransportError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct HealthReport {
    #[serde(default)]
    ok: bool,
}

/// Probe the backend's health endpoint.
///
/// Returns `Ok(true)` when the backend reports itself healthy.
pub async fn check_health(transport: &dyn Transport) -> Result<bool, TransportError> {
    let report: HealthReport = fetch_json(transport, HEALTH_PATH, &[]).await?;
    Ok(report.ok)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory transport.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// A request as seen by [`StubTransport`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRequest {
        pub path: String,
        pub query: Vec<(String, String)>,
    }

    impl RecordedRequest {
        pub fn param(&self, key: &str) -> Option<&str> {
            self.query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Replies with queued responses in order, then never resolves.
    #[derive(Debug, Default)]
    pub struct StubTransport {
        responses: Mutex<VecDeque<Result<serde_json::Value, TransportError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, response: Result<serde_json::Value, TransportError>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn fetch_resource(
            &self,
            path: &str,
            query: &[(&str, String)],
        ) -> Result<serde_json::Value, TransportError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                path: path.to_string(),
                query: query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            });
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(response) => response,
                None => std::future::pending().await,
            }
        }

        fn description(&self) -> &str {
            "stub"
        }
    }
}
