//! Document Host Abstraction
//!
//! The bootstrap needs three things from the page: a way to wait for the
//! document to become ready, a way to replace the root element's content, and
//! a way to hand the new root to the HTML behaviour engine (htmx) so it can
//! wire up its attributes.

use async_trait::async_trait;

use crate::error::Result;
use crate::platform::PlatformSendSync;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait DocumentHost: PlatformSendSync {
    /// Resolves once the page's ready event has fired.
    async fn ready(&self) -> Result<()>;

    /// Replace the content of the document's root element.
    fn replace_root(&self, html: &str) -> Result<()>;

    /// Hand the root element to the HTML behaviour engine for activation.
    fn activate_root(&self) -> Result<()>;
}
