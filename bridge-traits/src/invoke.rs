//! Host Bridge Abstraction
//!
//! The host environment exposes a single asynchronous call: a command name plus
//! a named-argument object in, a response descriptor out. Tauri hosts register
//! the command with `#[tauri::command]`; tests and native embeddings can route
//! it straight into an in-process router.

use async_trait::async_trait;

use crate::descriptor::{InvokeArgs, LocalResponse};
use crate::error::Result;
use crate::platform::PlatformSendSync;

/// Command name the host registers unless the page is told otherwise.
pub const DEFAULT_COMMAND: &str = "local_app_request";

/// Inter-process invocation mechanism connecting page code to the host.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::{HostInvoker, InvokeArgs, LocalRequest};
///
/// async fn home(invoker: &dyn HostInvoker) -> Result<Vec<u8>> {
///     let args = InvokeArgs::new(LocalRequest::get("/"));
///     let response = invoker.invoke("local_app_request", args).await?;
///     Ok(response.body)
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait HostInvoker: PlatformSendSync {
    /// Invoke `command` with `args` as its sole named argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the call or the returned value is
    /// not a response descriptor.
    async fn invoke(&self, command: &str, args: InvokeArgs) -> Result<LocalResponse>;
}
