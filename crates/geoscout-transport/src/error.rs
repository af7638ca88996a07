use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RequestError>;

/// Why a request did not produce a decoded payload.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("network error after {attempts} attempt(s): {message}")]
    Network { attempts: u32, message: String },
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RequestError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Only transport failures are worth another attempt; provider answers are final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// HTTP status returned by the provider, if it answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reported by a [`crate::Transport`] before any HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport deadline exceeded")]
    Timeout,
    #[error("{0}")]
    Network(String),
}

#[cfg(feature = "reqwest-transport")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}
