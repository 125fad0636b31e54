//! # Bridge Interceptor
//!
//! Replaces the page's network function with one that forwards every request
//! to the host's in-process server.
//!
//! ## Overview
//!
//! - [`PageFetch`] is the page-wide slot holding the active fetch. It captures
//!   the original fetch once and installs overrides on top of it.
//! - [`BridgeInterceptor`] is the override: reserved-scheme URLs go to the
//!   original fetch, everything else becomes a bridge call, with redirects
//!   followed on the page side.
//!
//! ## Usage
//!
//! ```ignore
//! use core_intercept::PageFetch;
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let page = PageFetch::new(Arc::new(native_fetch));
//! page.install_interceptor(Arc::new(invoker), BridgeConfig::default());
//!
//! let response = page.fetch("/", RequestInit::new()).await?;
//! ```

pub mod interceptor;
pub mod page;

pub use interceptor::BridgeInterceptor;
pub use page::PageFetch;
