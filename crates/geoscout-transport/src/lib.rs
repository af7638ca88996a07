//! Network plumbing shared by the geoscout clients.
//!
//! This crate knows nothing about addresses. It provides:
//!
//! - [`RateLimiter`]: a per-class minimum spacing gate for outgoing requests
//! - [`HttpRequestExecutor`]: one GET with a per-attempt deadline, bounded retries on
//!   transport failures only, and typed JSON decoding
//! - [`Transport`]: the seam between the executor and the HTTP client, with a
//!   reqwest-backed [`ReqwestTransport`] behind the default `reqwest-transport` feature
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use geoscout_transport::{HttpRequestExecutor, RateLimiter, ReqwestTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = RateLimiter::new(Duration::from_millis(300));
//! let executor = HttpRequestExecutor::new(ReqwestTransport::new()?);
//!
//! limiter.acquire(&"search").await;
//! let url = url::Url::parse("https://api.geoapify.com/v1/geocode/search?text=Ipoh")?;
//! let body: serde_json::Value = executor.execute(&url, Duration::from_secs(10), 2).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod executor;
mod rate_limit;
mod transport;

pub use error::{RequestError, Result, TransportError};
pub use executor::{HttpRequestExecutor, redact_url};
pub use rate_limit::RateLimiter;
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::{RawResponse, Transport};
pub use url::Url;
