//! Page-wide fetch slot.
//!
//! The page has exactly one network function. [`PageFetch`] captures the
//! original fetch when it is created and holds whichever
//! implementation is currently installed. Installing the interceptor always
//! wraps the captured original, never the current value, so calling
//! [`PageFetch::install_interceptor`] again replaces the override instead of
//! stacking a second layer on top of it.

use async_trait::async_trait;
use bridge_traits::{error::Result, Fetch, FetchResponse, HostInvoker, RequestInit};
use core_runtime::config::BridgeConfig;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::interceptor::BridgeInterceptor;

pub struct PageFetch {
    original: Arc<dyn Fetch>,
    current: RwLock<Arc<dyn Fetch>>,
}

impl PageFetch {
    /// Capture `native` as the page's original fetch.
    pub fn new(native: Arc<dyn Fetch>) -> Self {
        Self {
            current: RwLock::new(Arc::clone(&native)),
            original: native,
        }
    }

    /// The fetch captured at construction.
    pub fn original(&self) -> Arc<dyn Fetch> {
        Arc::clone(&self.original)
    }

    /// The fetch currently installed.
    pub fn current(&self) -> Arc<dyn Fetch> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    pub fn is_intercepted(&self) -> bool {
        let current = Arc::as_ptr(&self.current()) as *const ();
        current != Arc::as_ptr(&self.original) as *const ()
    }

    /// Replace the page's fetch with a bridge interceptor over the original.
    pub fn install_interceptor(
        &self,
        invoker: Arc<dyn HostInvoker>,
        config: BridgeConfig,
    ) -> Arc<BridgeInterceptor> {
        info!(
            command = %config.command,
            reserved_scheme = %config.reserved_scheme,
            "Installing bridge interceptor"
        );

        let interceptor = Arc::new(BridgeInterceptor::new(
            Arc::clone(&self.original),
            invoker,
            config,
        ));
        let installed: Arc<dyn Fetch> = interceptor.clone();

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = installed;

        interceptor
    }
}

/// Calls go to whatever is installed at call time.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Fetch for PageFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse> {
        let current = self.current();
        current.fetch(url, init).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{InvokeArgs, LocalResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NativeFetch;

    #[async_trait]
    impl Fetch for NativeFetch {
        async fn fetch(&self, url: &str, _init: RequestInit) -> Result<FetchResponse> {
            Ok(FetchResponse::new(200).with_url(url).with_body("native"))
        }
    }

    #[derive(Default)]
    struct CountingInvoker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HostInvoker for CountingInvoker {
        async fn invoke(&self, _command: &str, _args: InvokeArgs) -> Result<LocalResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LocalResponse::new(200).with_body("bridged"))
        }
    }

    #[tokio::test]
    async fn test_uses_native_until_installed() {
        let page = PageFetch::new(Arc::new(NativeFetch));

        assert!(!page.is_intercepted());
        let response = page.fetch("/", RequestInit::new()).await.unwrap();
        assert_eq!(response.text(), "native");
    }

    #[tokio::test]
    async fn test_install_routes_through_bridge() {
        let page = PageFetch::new(Arc::new(NativeFetch));
        let invoker = Arc::new(CountingInvoker::default());

        page.install_interceptor(invoker.clone(), BridgeConfig::default());

        assert!(page.is_intercepted());
        let response = page.fetch("/", RequestInit::new()).await.unwrap();
        assert_eq!(response.text(), "bridged");
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reinstall_does_not_stack() {
        let page = PageFetch::new(Arc::new(NativeFetch));
        let first = Arc::new(CountingInvoker::default());
        let second = Arc::new(CountingInvoker::default());

        page.install_interceptor(first.clone(), BridgeConfig::default());
        page.install_interceptor(second.clone(), BridgeConfig::default());

        page.fetch("/", RequestInit::new()).await.unwrap();
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);

        // Reserved URLs still reach the captured original, not a previous override
        let response = page
            .fetch("ipc://localhost/cmd", RequestInit::new())
            .await
            .unwrap();
        assert_eq!(response.text(), "native");
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }
}
