//! Threading bounds shared by every bridge trait.
//!
//! Native hosts share fetch and invoke implementations across tokio tasks and
//! need `Send + Sync`. Inside a webview compiled to `wasm32` the page is a
//! single thread and `web_sys` handles cannot satisfy those bounds, so the
//! markers below collapse to no-ops there.

/// Marker trait that applies `Send + Sync` on native targets while becoming a
/// no-op on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}
