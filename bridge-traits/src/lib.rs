//! # Host Bridge Traits
//!
//! Contract between the page-side interception layer and the host it runs in.
//!
//! ## Overview
//!
//! A webview page talks to an application server that lives inside the host
//! process. Nothing goes over the network: every request is serialized into a
//! [`LocalRequest`](descriptor::LocalRequest), carried across the host's
//! inter-process bridge, executed by the in-process server and returned as a
//! [`LocalResponse`](descriptor::LocalResponse).
//!
//! ## Traits
//!
//! - [`Fetch`](fetch::Fetch) - The page's asynchronous network function
//! - [`HostInvoker`](invoke::HostInvoker) - The host bridge (command + named arguments)
//! - [`DocumentHost`](document::DocumentHost) - Document readiness, root replacement, htmx activation
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Provides |
//! |----------|---------------------|----------|
//! | Desktop  | `bridge-desktop`    | `ReqwestFetch`, `RouterInvoker` |
//! | Web      | `bridge-wasm`       | `WindowFetch`, `TauriInvoker`, `WebDocument` |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform-specific errors to `BridgeError`
//! and keep the failing command or URL in the message.
//!
//! ## Thread Safety
//!
//! Traits require `Send + Sync` on native targets and nothing on `wasm32`,
//! see [`platform::PlatformSendSync`].

pub mod descriptor;
pub mod document;
pub mod error;
pub mod fetch;
pub mod invoke;
pub mod platform;

pub use error::BridgeError;

// Re-export commonly used types
pub use descriptor::{
    InvokeArgs, LocalRequest, LocalResponse, RequestBody, DEFAULT_METHOD, REDIRECT_STATUS_CODES,
};
pub use document::DocumentHost;
pub use fetch::{CredentialsMode, Fetch, FetchResponse, Headers, RequestInit, RequestMode};
pub use invoke::{HostInvoker, DEFAULT_COMMAND};
pub use platform::PlatformSendSync;
