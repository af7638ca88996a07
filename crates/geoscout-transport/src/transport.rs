//! The network seam: one GET, returning the status and body as received.

use std::{future::Future, sync::Arc};

use url::Url;

use crate::error::TransportError;

/// Status line and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can issue a single HTTP GET.
///
/// Implementations must not retry and need not enforce a deadline; both are the
/// job of [`crate::HttpRequestExecutor`]. Returning [`TransportError::Timeout`] is
/// allowed when the underlying client has its own deadline.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn get(&self, url: &Url) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        (**self).get(url)
    }
}

#[cfg(feature = "reqwest-transport")]
pub use reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
mod reqwest_transport {
    use reqwest::{Client, header::ACCEPT};
    use tracing::trace;
    use url::Url;

    use super::{RawResponse, Transport};
    use crate::error::TransportError;

    const USER_AGENT: &str = concat!("geoscout/", env!("CARGO_PKG_VERSION"));

    /// Production transport backed by a shared [`reqwest::Client`].
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Result<Self, TransportError> {
            let client = Client::builder().user_agent(USER_AGENT).build()?;
            Ok(Self { client })
        }

        /// Reuse an existing client (connection pool, proxy settings, ...).
        #[must_use]
        pub const fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    impl Transport for ReqwestTransport {
        async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
            let response = self
                .client
                .get(url.clone())
                .header(ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            trace!(status, bytes = body.len(), "Response received");
            Ok(RawResponse { status, body })
        }
    }
}
