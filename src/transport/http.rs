//! HTTP transport over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use tracing::trace;

use super::{Transport, TransportError};

/// Transport that issues `GET <base_url><path>?<query>` requests.
///
/// Credentials are forwarded as-is: an optional session cookie is attached
/// to every request, and with `include_credentials` enabled any cookie the
/// backend sets is kept and replayed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpTransport {
    /// Create a new builder for configuring the transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// The root every resource path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_resource(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, TransportError> {
        let url = self.url(path);
        trace!(%url, ?query, "GET");

        let mut request = self.client.get(&url).query(query);
        if let Some(ref cookie) = self.session_cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                path: path.to_string(),
                code: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TransportError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    fn description(&self) -> &str {
        &self.base_url
    }
}

/// Builder for HttpTransport.
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    base_url: Option<String>,
    session_cookie: Option<String>,
    include_credentials: Option<bool>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Set the backend root (e.g., "http://localhost:8000/api").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Attach a `Cookie` header value to every request.
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Keep and replay cookies set by the backend (default: true).
    pub fn include_credentials(mut self, include: bool) -> Self {
        self.include_credentials = Some(include);
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the transport.
    pub fn build(self) -> reqwest::Result<HttpTransport> {
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .cookie_store(self.include_credentials.unwrap_or(true))
            .build()?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(HttpTransport {
            client,
            base_url,
            session_cookie: self.session_cookie,
        })
    }
}
