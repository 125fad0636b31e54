//! JavaScript entry point for WebAssembly builds.
//!
//! ```html
//! <script src="https://unpkg.com/htmx.org@2.0.4"></script>
//! <script type="module">
//!   import init, { initialize } from "./pkg/tauri_htmx_bridge.js";
//!
//!   await init();
//!   await initialize("/");
//! </script>
//! ```
//!
//! `initialize` replaces `window.fetch` and `window.XMLHttpRequest` before the
//! first page is rendered, so requests htmx issues while processing that page
//! already go through the bridge.

mod request;

pub use request::{BridgeUpload, BridgeXmlHttpRequest};

use std::cell::RefCell;
use std::sync::Arc;

use core_intercept::PageFetch;
use tracing::info;
use wasm_bindgen::prelude::*;

thread_local! {
    static PAGE: RefCell<Option<Arc<PageFetch>>> = const { RefCell::new(None) };
}

/// The page fetch behind `window.fetch` and `window.XMLHttpRequest`, if one
/// was installed.
pub fn page() -> Option<Arc<PageFetch>> {
    PAGE.with(|page| page.borrow().clone())
}

/// Make `page` the target of `new XMLHttpRequest()`.
///
/// `window.fetch` is left alone; [`core_service::wasm_page`] points it at the
/// page it creates.
pub fn install_page(page: Arc<PageFetch>) -> Result<(), JsValue> {
    PAGE.with(|slot| *slot.borrow_mut() = Some(Arc::clone(&page)));
    request::install_request_class(page)?;
    info!("window.XMLHttpRequest routed through the bridge");
    Ok(())
}

/// Install the bridge and render `initial_path`.
///
/// The page-wide overrides are installed on the first call only. Calling it
/// again re-runs the bootstrap on the same page fetch, which replaces the
/// interceptor instead of stacking another one.
#[wasm_bindgen(js_name = initialize)]
pub async fn initialize_js(initial_path: String, command: Option<String>) -> Result<(), JsValue> {
    let page = match page() {
        Some(page) => page,
        None => {
            let page = core_service::wasm_page().map_err(to_js_error)?;
            install_page(Arc::clone(&page))?;
            page
        }
    };

    core_service::bootstrap_wasm(&page, &initial_path, command.as_deref())
        .await
        .map_err(to_js_error)
}

fn to_js_error(err: core_service::CoreError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
