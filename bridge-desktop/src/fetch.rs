//! Native network primitive using Reqwest.
//!
//! Native embeddings have no browser `fetch`; this is what a page fetch slot
//! captures as its original fetch, so reserved-scheme URLs (and any
//! page running without the interceptor) still reach the network.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    Fetch, FetchResponse, Headers, RequestInit,
};
use futures::future::{select, Either};
use futures::pin_mut;
use reqwest::{Client, Method, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// Reqwest-based implementation of the page's fetch.
///
/// Honors the request's cancellation signal: a cancelled token resolves the
/// call with [`BridgeError::Aborted`] and drops the in-flight request.
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    /// Create a fetch with default timeouts.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("tauri-htmx-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_request(&self, url: &str, init: RequestInit) -> Result<reqwest::RequestBuilder> {
        let method = Method::from_bytes(init.method_or_default().to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                BridgeError::OperationFailed(format!("Invalid method: {}", init.method_or_default()))
            })?;

        let mut request = self.client.request(method, url);
        for (key, value) in init.headers {
            request = request.header(key, value);
        }
        if let Some(body) = init.body {
            request = request.body(body.into_bytes());
        }

        Ok(request)
    }

    async fn execute(&self, url: &str, request: reqwest::RequestBuilder) -> Result<FetchResponse> {
        let response = request.send().await.map_err(|e| {
            warn!(url, error = %e, "Native fetch failed");
            if e.is_timeout() {
                BridgeError::OperationFailed("Request timed out".to_string())
            } else if e.is_connect() {
                BridgeError::OperationFailed(format!("Connection failed: {}", e))
            } else {
                BridgeError::OperationFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let redirected = was_redirected(url, response.url());
        let final_url = response.url().to_string();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.as_str().to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        debug!(url, status = status.as_u16(), bytes = body.len(), "Native fetch completed");

        let mut fetched = FetchResponse::new(status.as_u16())
            .with_status_text(status.canonical_reason().unwrap_or_default())
            .with_headers(headers)
            .with_body(body);
        fetched.redirected = redirected;
        Ok(fetched.with_url(final_url))
    }
}

/// Compare normalized URLs; `http://host` and `http://host/` are the same
/// target.
fn was_redirected(requested: &str, final_url: &Url) -> bool {
    Url::parse(requested).map_or(true, |requested| requested != *final_url)
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse> {
        if init.is_aborted() {
            return Err(BridgeError::Aborted);
        }

        let signal = init.signal.clone();
        let request = self.build_request(url, init)?;
        let call = self.execute(url, request);

        let Some(signal) = signal else {
            return call.await;
        };

        let cancelled = signal.cancelled();
        pin_mut!(cancelled);
        pin_mut!(call);

        match select(cancelled, call).await {
            Either::Left(_) => {
                debug!(url, "Native fetch aborted");
                Err(BridgeError::Aborted)
            }
            Either::Right((result, _)) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_build_request_maps_fields() {
        let fetch = ReqwestFetch::new().unwrap();
        let init = RequestInit::new()
            .method("patch")
            .header("X-Test", "1")
            .body("payload");

        let request = fetch
            .build_request("http://localhost/items", init)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.url().as_str(), "http://localhost/items");
        assert_eq!(request.headers().get("x-test").unwrap(), "1");
        assert_eq!(request.body().and_then(|b| b.as_bytes()), Some(&b"payload"[..]));
    }

    #[test]
    fn test_build_request_rejects_bad_method() {
        let fetch = ReqwestFetch::new().unwrap();
        let result = fetch.build_request("http://localhost/", RequestInit::new().method("NOT A METHOD"));
        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));
    }

    #[test]
    fn test_normalized_url_is_not_a_redirect() {
        let final_url = Url::parse("http://localhost/").unwrap();

        assert!(!was_redirected("http://localhost", &final_url));
        assert!(!was_redirected("http://localhost/", &final_url));
        assert!(was_redirected("http://localhost/old", &final_url));
    }

    #[tokio::test]
    async fn test_pre_aborted_signal_skips_network() {
        let fetch = ReqwestFetch::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = fetch
            .fetch("http://127.0.0.1:9/", RequestInit::new().signal(token))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Aborted));
    }
}
