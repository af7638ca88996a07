//! Single-GET execution with a per-attempt deadline, bounded retries and typed decoding.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    error::{RequestError, Result, TransportError},
    transport::Transport,
};

/// Query parameters whose values never appear in logs.
const SECRET_PARAMS: &[&str] = &["apiKey", "api_key", "key", "token"];

#[derive(Debug, Clone)]
pub struct HttpRequestExecutor<T> {
    transport: T,
    backoff_base: Duration,
}

impl<T: Transport> HttpRequestExecutor<T> {
    pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(2000);

    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            backoff_base: Self::DEFAULT_BACKOFF_BASE,
        }
    }

    /// Retry `n` (0-based) waits `backoff_base * (n + 1)` before the next attempt.
    #[must_use]
    pub const fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue a GET and decode the body as `R`.
    ///
    /// Each attempt gets its own `timeout`; there is no overall deadline. Only
    /// transport failures are retried, up to `max_retries` extra attempts. A deadline
    /// overrun, a non-2xx status or an undecodable body is returned immediately.
    #[instrument(name = "Execute request", skip(self, url), fields(url = %redact_url(url)), level = "debug")]
    pub async fn execute<R: DeserializeOwned>(
        &self,
        url: &Url,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<R> {
        let mut attempt: u32 = 0;
        loop {
            debug!(attempt = attempt + 1, "Issuing request");

            let outcome = tokio::time::timeout(timeout, self.transport.get(url)).await;
            let response = match outcome {
                Err(_) | Ok(Err(TransportError::Timeout)) => {
                    warn!(timeout_ms = timeout.as_millis() as u64, "Request timed out");
                    return Err(RequestError::Timeout(timeout));
                }
                Ok(Err(TransportError::Network(message))) => {
                    if attempt < max_retries {
                        let delay = self.backoff_base * (attempt + 1);
                        warn!(
                            retry = attempt + 1,
                            max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %message,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(RequestError::Network {
                        attempts: attempt + 1,
                        message,
                    });
                }
                Ok(Ok(response)) => response,
            };

            if !response.is_success() {
                debug!(status = response.status, "Provider returned an error status");
                return Err(RequestError::Http {
                    status: response.status,
                    body: response.body,
                });
            }

            return serde_json::from_str(&response.body).map_err(RequestError::from);
        }
    }
}

/// Render `url` with the values of credential-like query parameters masked.
pub fn redact_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use serde::Deserialize;
    use tokio::time::Instant;

    use super::*;
    use crate::transport::RawResponse;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        ok: bool,
    }

    /// Replays a fixed script of outcomes, one per call.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<std::result::Result<RawResponse, TransportError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(script: Vec<std::result::Result<RawResponse, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for ScriptedTransport {
        async fn get(&self, _url: &Url) -> std::result::Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more often than scripted")
        }
    }

    /// Never answers.
    struct HangingTransport {
        calls: AtomicUsize,
    }

    impl Transport for HangingTransport {
        async fn get(&self, _url: &Url) -> std::result::Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn url() -> Url {
        Url::parse("https://api.example.com/v1/geocode/search?text=x&apiKey=secret").unwrap()
    }

    fn network_error() -> std::result::Result<RawResponse, TransportError> {
        Err(TransportError::Network("connection refused".to_string()))
    }

    fn ok_body() -> std::result::Result<RawResponse, TransportError> {
        Ok(RawResponse::new(200, r#"{"ok": true}"#))
    }

    const TIMEOUT: Duration = Duration::from_millis(10_000);

    #[tokio::test(start_paused = true)]
    async fn test_success_is_decoded() {
        let executor = HttpRequestExecutor::new(ScriptedTransport::new(vec![ok_body()]));
        let payload: Payload = executor.execute(&url(), TIMEOUT, 2).await.unwrap();
        assert_eq!(payload, Payload { ok: true });
        assert_eq!(executor.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_network_errors_then_succeeds() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            network_error(),
            network_error(),
            ok_body(),
        ]));
        let executor = HttpRequestExecutor::new(Arc::clone(&transport));

        let start = Instant::now();
        let payload: Payload = executor.execute(&url(), TIMEOUT, 2).await.unwrap();

        assert!(payload.ok);
        assert_eq!(transport.calls(), 3);
        // 2000ms after the first failure, 4000ms after the second
        assert!(start.elapsed() >= Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_surfaces_after_retries_exhausted() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            network_error(),
            network_error(),
            network_error(),
        ]));
        let executor = HttpRequestExecutor::new(Arc::clone(&transport));

        let err = executor
            .execute::<Payload>(&url(), TIMEOUT, 2)
            .await
            .unwrap_err();

        assert!(matches!(err, RequestError::Network { attempts: 3, .. }));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_means_single_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![network_error()]));
        let executor = HttpRequestExecutor::new(Arc::clone(&transport));

        let err = executor
            .execute::<Payload>(&url(), TIMEOUT, 0)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_retried() {
        let transport = Arc::new(HangingTransport {
            calls: AtomicUsize::new(0),
        });
        let executor = HttpRequestExecutor::new(Arc::clone(&transport));

        let start = Instant::now();
        let err = executor
            .execute::<Payload>(&url(), Duration::from_millis(500), 2)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_reported_timeout_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(TransportError::Timeout)]));
        let executor = HttpRequestExecutor::new(Arc::clone(&transport));

        let err = executor
            .execute::<Payload>(&url(), TIMEOUT, 2)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(
            401,
            "Invalid apiKey",
        ))]));
        let executor = HttpRequestExecutor::new(Arc::clone(&transport));

        let err = executor
            .execute::<Payload>(&url(), TIMEOUT, 2)
            .await
            .unwrap_err();

        match err {
            RequestError::Http { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Invalid apiKey");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_is_decode_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(
            200,
            "<html>gateway</html>",
        ))]));
        let executor = HttpRequestExecutor::new(Arc::clone(&transport));

        let err = executor
            .execute::<Payload>(&url(), TIMEOUT, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_backoff_base() {
        let transport = Arc::new(ScriptedTransport::new(vec![network_error(), ok_body()]));
        let executor = HttpRequestExecutor::new(Arc::clone(&transport))
            .with_backoff_base(Duration::from_millis(100));

        let start = Instant::now();
        let _: Payload = executor.execute(&url(), TIMEOUT, 1).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_millis(2000));
    }

    #[test]
    fn test_redact_url_masks_credentials() {
        let redacted = redact_url(&url());
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("apiKey=***") || redacted.contains("apiKey=%2A%2A%2A"));
        assert!(redacted.contains("text=x"));
    }

    #[test]
    fn test_redact_url_without_query() {
        let plain = Url::parse("https://api.example.com/v1/status").unwrap();
        assert_eq!(redact_url(&plain), "https://api.example.com/v1/status");
    }
}
