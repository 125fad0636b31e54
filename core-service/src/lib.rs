//! Bootstrap for the page-side bridge.
//!
//! [`initialize`] is the entry point a page calls once: it installs the bridge
//! interceptor on the page's fetch slot, waits for the document, loads the
//! initial path through the bridge and hands the result to htmx.
//!
//! Desktop embeddings enable the `desktop` feature for a reqwest-backed native
//! fetch, whereas WebAssembly builds enable the `wasm` feature and rely on the
//! browser adapters from `bridge-wasm`.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{DocumentHost, Fetch, HostInvoker, RequestInit, DEFAULT_METHOD};
use core_intercept::PageFetch;
use core_runtime::config::BridgeConfig;
use tracing::{debug, info, warn};

#[cfg(all(feature = "desktop", not(target_arch = "wasm32")))]
use bridge_desktop::ReqwestFetch;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
use bridge_traits::BridgeError;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
use bridge_wasm::{install_fetch_override, TauriInvoker, WebDocument, WindowFetch};

/// Page bootstrapper carrying the bridge configuration.
#[derive(Debug, Clone, Default)]
pub struct HtmxBridge {
    config: BridgeConfig,
}

impl HtmxBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Install the interceptor on `page`, then render `initial_path` into the
    /// document once it is ready.
    ///
    /// The initial response is rendered whatever its status; error pages from
    /// the application server are content like any other.
    ///
    /// # Errors
    ///
    /// Fails when the bridge call for the initial path fails or the document
    /// rejects one of the bootstrap steps. The interceptor stays installed
    /// either way.
    pub async fn initialize(
        &self,
        page: &PageFetch,
        invoker: Arc<dyn HostInvoker>,
        document: &dyn DocumentHost,
        initial_path: &str,
    ) -> Result<()> {
        page.install_interceptor(invoker, self.config.clone());

        document
            .ready()
            .await
            .map_err(|e| CoreError::document("ready", e))?;
        debug!(initial_path, "Document ready, loading initial path");

        let response = page
            .fetch(initial_path, RequestInit::new().method(DEFAULT_METHOD))
            .await?;
        if !response.ok() {
            warn!(
                initial_path,
                status = response.status,
                "Initial path returned a non-success status"
            );
        }

        document
            .replace_root(&response.text())
            .map_err(|e| CoreError::document("replace_root", e))?;
        document
            .activate_root()
            .map_err(|e| CoreError::document("activate_root", e))?;

        info!(initial_path, status = response.status, "Page initialized");
        Ok(())
    }
}

/// Initialize with the default configuration, optionally overriding the
/// bridge command.
///
/// ```ignore
/// let page = PageFetch::new(native_fetch);
/// core_service::initialize(&page, invoker, &document, "/", None).await?;
/// ```
pub async fn initialize(
    page: &PageFetch,
    invoker: Arc<dyn HostInvoker>,
    document: &dyn DocumentHost,
    initial_path: &str,
    command_override: Option<&str>,
) -> Result<()> {
    let config = BridgeConfig::with_command_override(command_override)?;
    HtmxBridge::new(config)
        .initialize(page, invoker, document, initial_path)
        .await
}

/// Page fetch for native embeddings: reqwest for reserved-scheme URLs and
/// `invoker` for everything else.
#[cfg(all(feature = "desktop", not(target_arch = "wasm32")))]
pub fn native_page(invoker: Arc<dyn HostInvoker>, config: BridgeConfig) -> Result<PageFetch> {
    config.validate()?;
    let page = PageFetch::new(Arc::new(ReqwestFetch::new()?));
    page.install_interceptor(invoker, config);
    Ok(page)
}

/// Page fetch for a WebAssembly page inside a Tauri webview.
///
/// Captures the browser's `window.fetch` as the original and points
/// `window.fetch` at the returned slot, so page scripts go through whatever
/// is installed there.
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub fn wasm_page() -> Result<Arc<PageFetch>> {
    let page = Arc::new(PageFetch::new(Arc::new(WindowFetch::new()?)));
    install_fetch_override(page.clone()).map_err(BridgeError::from)?;
    Ok(page)
}

/// Convenience bootstrapper for WebAssembly hosts running inside a Tauri
/// webview.
///
/// ```ignore
/// let page = core_service::wasm_page()?;
/// core_service::bootstrap_wasm(&page, "/", None).await?;
/// let request = core_xhr::LegacyRequest::new(page.clone());
/// ```
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub async fn bootstrap_wasm(
    page: &PageFetch,
    initial_path: &str,
    command_override: Option<&str>,
) -> Result<()> {
    let invoker: Arc<dyn HostInvoker> = Arc::new(TauriInvoker::new()?);
    let document = WebDocument::new()?;

    initialize(page, invoker, &document, initial_path, command_override).await
}
