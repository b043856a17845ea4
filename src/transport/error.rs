//! Error types for the transport layer.

use thiserror::Error;

/// A failed round trip to the backend.
///
/// Every variant is recoverable: the polling engine records it as the
/// source's `last_error` and tries again on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("request to {path} failed with status {code}")]
    Status { path: String, code: u16 },

    /// No response was received (connection refused, reset, DNS, ...).
    #[error("request to {path} failed: {reason}")]
    Network { path: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("request to {path} timed out")]
    Timeout { path: String },

    /// A success response whose body could not be decoded.
    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl TransportError {
    /// HTTP status code, present only when the server responded.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The resource path the failed request targeted.
    pub fn path(&self) -> &str {
        match self {
            TransportError::Status { path, .. }
            | TransportError::Network { path, .. }
            | TransportError::Timeout { path }
            | TransportError::Decode { path, .. } => path,
        }
    }

    /// Classify a reqwest failure for the given path.
    pub(crate) fn from_reqwest(path: &str, err: reqwest::Error) -> Self {
        let path = path.to_string();
        if err.is_timeout() {
            TransportError::Timeout { path }
        } else if err.is_decode() {
            TransportError::Decode {
                path,
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            TransportError::Status {
                path,
                code: status.as_u16(),
            }
        } else {
            TransportError::Network {
                path,
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_only_for_status_errors() {
        let status = TransportError::Status {
            path: "/stats".to_string(),
            code: 503,
        };
        assert_eq!(status.status_code(), Some(503));
        assert_eq!(status.to_string(), "request to /stats failed with status 503");

        let network = TransportError::Network {
            path: "/stats".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(network.status_code(), None);

        let decode = TransportError::Decode {
            path: "/transactions".to_string(),
            reason: "expected array".to_string(),
        };
        assert_eq!(decode.status_code(), None);
        assert_eq!(decode.path(), "/transactions");
    }
}
