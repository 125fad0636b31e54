//! Tauri HTMX bridge.
//!
//! Makes an application server embedded in a Tauri host look like an ordinary
//! HTTP endpoint to a webview page. The page's `fetch` is replaced by a bridge
//! interceptor that forwards requests over the host's IPC channel, and the
//! legacy event-driven request object is emulated on top of it so htmx and
//! similar libraries work unchanged.
//!
//! This crate re-exports the workspace crates behind one dependency:
//!
//! - [`traits`]: descriptors and the `Fetch` / `HostInvoker` / `DocumentHost` seams
//! - [`PageFetch`] and [`BridgeInterceptor`]: the page-side override
//! - [`LegacyRequest`]: the event-driven request object
//! - [`initialize`] and [`HtmxBridge`]: page bootstrap
//! - [`config`] and [`logging`]: runtime configuration
//!
//! ## Features
//!
//! - `desktop` (default): native `ReqwestFetch` and the Axum `RouterInvoker`
//! - `wasm`: browser adapters and a JavaScript `initialize(initialPath, command?)`
//!   export that replaces `window.fetch` and `window.XMLHttpRequest`

pub use bridge_traits as traits;
pub use core_runtime::{config, logging};

pub use bridge_traits::{
    BridgeError, Fetch, FetchResponse, HostInvoker, LocalRequest, LocalResponse, RequestInit,
};
pub use core_intercept::{BridgeInterceptor, PageFetch};
pub use core_runtime::config::BridgeConfig;
pub use core_service::{initialize, CoreError, HtmxBridge};
pub use core_xhr::{Event, EventTarget, LegacyRequest, ReadyState, ResponseBody};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod wasm;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use wasm::{install_page, page, BridgeUpload, BridgeXmlHttpRequest};
