//! WebAssembly Bridge Implementations
//!
//! This crate provides browser implementations of the bridge traits defined in
//! `bridge-traits`, for pages running inside a Tauri webview. They use browser
//! APIs through `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! On native targets it compiles to an empty crate.
//!
//! # Implementations
//!
//! - `WindowFetch`: the page's original `window.fetch`
//! - `TauriInvoker`: `window.__TAURI__.core.invoke`
//! - `WebDocument`: `document` readiness, `<body>` replacement and
//!   `htmx.process`
//! - [`page::install_fetch_override`]: points `window.fetch` at any [`Fetch`](bridge_traits::Fetch)
//!   implementation
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{TauriInvoker, WebDocument, WindowFetch};
//! use core_intercept::PageFetch;
//! use std::sync::Arc;
//!
//! let page = PageFetch::new(Arc::new(WindowFetch::new()?));
//! core_service::initialize(&page, Arc::new(TauriInvoker::new()?), &WebDocument::new()?, "/", None).await?;
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod fetch;
pub mod invoke;
pub mod page;

// Re-export commonly used types
pub use document::WebDocument;
pub use error::{WasmError, WasmResult};
pub use fetch::WindowFetch;
pub use invoke::TauriInvoker;
pub use page::install_fetch_override;
