//! # Desktop Bridge Implementations
//!
//! Native implementations of the bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - [`ReqwestFetch`] implements `Fetch` with `reqwest`; it is the original
//!   network function a native page fetch slot captures.
//! - [`RouterInvoker`] implements `HostInvoker` by running request
//!   descriptors through an Axum [`Router`](axum::Router). Inside a Tauri
//!   command, [`RouterInvoker::send`] is the whole handler.
//!
//! ## Usage
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use bridge_desktop::RouterInvoker;
//! use bridge_traits::{LocalRequest, LocalResponse};
//!
//! #[tauri::command]
//! async fn local_app_request(
//!     state: tauri::State<'_, RouterInvoker>,
//!     local_request: LocalRequest,
//! ) -> Result<LocalResponse, ()> {
//!     Ok(state.send(local_request).await)
//! }
//!
//! fn main() {
//!     let app = Router::new().route("/", get(|| async { "Hello, World!" }));
//!     tauri::Builder::default()
//!         .manage(RouterInvoker::new(app))
//!         .invoke_handler(tauri::generate_handler![local_app_request]);
//! }
//! ```

mod fetch;
pub mod router;

pub use fetch::ReqwestFetch;
pub use router::{DescriptorError, RouterInvoker};
