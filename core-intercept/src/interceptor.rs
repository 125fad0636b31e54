//! Fetch implementation that routes requests across the host bridge.
//!
//! Every request whose URL is not on the reserved internal scheme is turned
//! into a [`LocalRequest`], sent to the host with the configured command, and
//! the resulting [`LocalResponse`] is rebuilt into a [`FetchResponse`]. The
//! host does not follow redirects, so the interceptor does: each 3xx hop is
//! re-issued as a bare `GET` for the `location` header.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    Fetch, FetchResponse, Headers, HostInvoker, InvokeArgs, LocalRequest, LocalResponse,
    RequestInit, DEFAULT_METHOD,
};
use core_runtime::config::BridgeConfig;
use core_runtime::logging::redact_header;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Bridge-backed replacement for the page's fetch function.
pub struct BridgeInterceptor {
    original: Arc<dyn Fetch>,
    invoker: Arc<dyn HostInvoker>,
    config: BridgeConfig,
}

impl BridgeInterceptor {
    /// Wrap `original`, which keeps serving reserved-scheme URLs.
    pub fn new(
        original: Arc<dyn Fetch>,
        invoker: Arc<dyn HostInvoker>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            original,
            invoker,
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    async fn bridged(&self, url: &str, init: RequestInit) -> Result<FetchResponse> {
        let request = describe(url, init);
        debug!(
            url,
            method = %request.method,
            command = %self.config.command,
            "Forwarding request across bridge"
        );
        for (name, value) in &request.headers {
            trace!(header = %name, value = redact_header(name, value), "Request header");
        }

        let mut response = self
            .invoker
            .invoke(&self.config.command, InvokeArgs::new(request))
            .await?;

        let mut final_url = url.to_string();
        let mut hops = 0usize;

        while response.is_redirect() {
            let location = response
                .header("location")
                .ok_or(BridgeError::MissingLocation {
                    status: response.status_code,
                })?
                .to_string();

            hops += 1;
            if let Some(max) = self.config.max_redirects {
                if hops > max {
                    warn!(url, max, "Redirect limit exceeded");
                    return Err(BridgeError::TooManyRedirects(max));
                }
            }

            debug!(
                status = response.status_code,
                location = %location,
                hop = hops,
                "Following redirect"
            );

            response = self
                .invoker
                .invoke(
                    self.config.redirect_command(),
                    InvokeArgs::new(LocalRequest::get(location.clone())),
                )
                .await?;
            final_url = location;
        }

        debug!(url, status = response.status_code, hops, "Bridge request completed");
        Ok(reconstruct(response, final_url, hops > 0))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Fetch for BridgeInterceptor {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse> {
        if self.config.is_reserved(url) {
            debug!(url, "Reserved scheme, using original fetch");
            return self.original.fetch(url, init).await;
        }

        self.bridged(url, init).await
    }
}

/// Request descriptor for `url`. Only method, headers and body cross the
/// bridge.
fn describe(url: &str, init: RequestInit) -> LocalRequest {
    LocalRequest {
        uri: url.to_string(),
        method: init.method.unwrap_or_else(|| DEFAULT_METHOD.to_string()),
        headers: init.headers,
        body: init.body,
    }
}

/// Response object for the page. The body is always decoded as UTF-8 and
/// headers come back ordered by name.
fn reconstruct(response: LocalResponse, url: String, redirected: bool) -> FetchResponse {
    let text = String::from_utf8_lossy(&response.body).into_owned();
    let mut reconstructed = FetchResponse::new(response.status_code)
        .with_url(url)
        .with_headers(Headers::from(response.headers))
        .with_body(text);
    reconstructed.redirected = redirected;
    reconstructed
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Invoker {}

        #[async_trait]
        impl HostInvoker for Invoker {
            async fn invoke(&self, command: &str, args: InvokeArgs) -> Result<LocalResponse>;
        }
    }

    mock! {
        Native {}

        #[async_trait]
        impl Fetch for Native {
            async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse>;
        }
    }

    fn interceptor(native: MockNative, invoker: MockInvoker) -> BridgeInterceptor {
        BridgeInterceptor::new(Arc::new(native), Arc::new(invoker), BridgeConfig::default())
    }

    #[test]
    fn test_describe_applies_defaults() {
        let request = describe("/items", RequestInit::new());

        assert_eq!(request.uri, "/items");
        assert_eq!(request.method, "GET");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_describe_keeps_caller_fields() {
        let request = describe(
            "/items",
            RequestInit::new()
                .method("POST")
                .header("HX-Request", "true")
                .body("name=x"),
        );

        assert_eq!(request.method, "POST");
        assert_eq!(request.headers.get("HX-Request"), Some(&"true".to_string()));
        assert_eq!(request.body, Some("name=x".into()));
    }

    #[test]
    fn test_reconstruct_decodes_body_lossily() {
        let response = LocalResponse::new(200)
            .with_header("Content-Type", "text/html")
            .with_body(vec![0x3c, 0x70, 0x3e, 0xff]);

        let rebuilt = reconstruct(response, "/".into(), false);

        assert_eq!(rebuilt.status, 200);
        assert_eq!(rebuilt.text(), "<p>\u{fffd}");
        assert_eq!(rebuilt.headers.get("content-type"), Some("text/html"));
        assert!(!rebuilt.redirected);
    }

    #[test]
    fn test_reconstruct_orders_headers_by_name() {
        let response = LocalResponse::new(200)
            .with_header("X-Request-Id", "7")
            .with_header("Content-Type", "text/html")
            .with_header("HX-Trigger", "saved")
            .with_header("Cache-Control", "no-store");

        let rebuilt = reconstruct(response, "/".into(), false);

        let names: Vec<&str> = rebuilt.headers.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["cache-control", "content-type", "hx-trigger", "x-request-id"]
        );
    }

    #[tokio::test]
    async fn test_reserved_scheme_bypasses_bridge() {
        let mut native = MockNative::new();
        native
            .expect_fetch()
            .withf(|url: &str, _init: &RequestInit| url == "ipc://localhost/plugin:event")
            .times(1)
            .returning(|_, _| Ok(FetchResponse::new(204)));

        let mut invoker = MockInvoker::new();
        invoker.expect_invoke().never();

        let response = interceptor(native, invoker)
            .fetch("ipc://localhost/plugin:event", RequestInit::new())
            .await
            .unwrap();

        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_non_redirect_status_passes_through() {
        let native = MockNative::new();
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .withf(|command: &str, args: &InvokeArgs| {
                command == "local_app_request" && args.local_request.uri == "/missing"
            })
            .times(1)
            .returning(|_, _| Ok(LocalResponse::new(404).with_body("not found")));

        let response = interceptor(native, invoker)
            .fetch("/missing", RequestInit::new())
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "not found");
        assert_eq!(response.url, "/missing");
    }

    #[tokio::test]
    async fn test_bridge_failure_propagates() {
        let native = MockNative::new();
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .times(1)
            .returning(|command, _| Err(BridgeError::invoke_failed(command, "host unavailable")));

        let err = interceptor(native, invoker)
            .fetch("/", RequestInit::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::InvokeFailed { .. }));
    }

    #[tokio::test]
    async fn test_redirect_without_location_fails() {
        let native = MockNative::new();
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .times(1)
            .returning(|_, _| Ok(LocalResponse::new(302)));

        let err = interceptor(native, invoker)
            .fetch("/old", RequestInit::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::MissingLocation { status: 302 }));
    }
}
