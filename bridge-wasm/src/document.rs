//! Browser document host: readiness, body replacement and htmx activation.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    DocumentHost,
};
use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AddEventListenerOptions, Document, HtmlElement};

use crate::error::WasmError;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = htmx, js_name = process, catch)]
    fn htmx_process(element: &HtmlElement) -> Result<(), JsValue>;
}

/// [`DocumentHost`] over the current page's `document`, using its `<body>` as
/// the root element.
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    /// Bind to the current window's document.
    pub fn new() -> BridgeResult<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| BridgeError::NotAvailable("document".to_string()))?;
        Ok(Self { document })
    }

    fn body(&self) -> BridgeResult<HtmlElement> {
        self.document
            .body()
            .ok_or_else(|| BridgeError::NotAvailable("document.body".to_string()))
    }

    fn is_loading(&self) -> bool {
        self.document.ready_state() == "loading"
    }
}

#[async_trait(?Send)]
impl DocumentHost for WebDocument {
    async fn ready(&self) -> BridgeResult<()> {
        if !self.is_loading() {
            return Ok(());
        }

        let document = self.document.clone();
        let loaded = Promise::new(&mut |resolve: Function, reject: Function| {
            let options = AddEventListenerOptions::new();
            options.set_once(true);
            let listener = Closure::once_into_js(move || {
                let _ = resolve.call0(&JsValue::NULL);
            });
            if let Err(err) = document.add_event_listener_with_callback_and_add_event_listener_options(
                "DOMContentLoaded",
                listener.unchecked_ref(),
                &options,
            ) {
                let _ = reject.call1(&JsValue::NULL, &err);
            }
        });

        JsFuture::from(loaded)
            .await
            .map(|_| ())
            .map_err(|err| WasmError::js("DOMContentLoaded", err).into())
    }

    fn replace_root(&self, html: &str) -> BridgeResult<()> {
        self.body()?.set_inner_html(html);
        Ok(())
    }

    fn activate_root(&self) -> BridgeResult<()> {
        let body = self.body()?;
        htmx_process(&body).map_err(|err| WasmError::js("htmx.process", err).into())
    }
}
