//! `XMLHttpRequest` replacement exported to page scripts.
//!
//! [`BridgeXmlHttpRequest`] is a thin JS face over [`LegacyRequest`]: method
//! and property names follow the browser object, and every call ends up in the
//! page fetch the class was installed with. JS listeners receive a plain event
//! object (`type`, `loaded`, `total`, `lengthComputable`, `message`) and are
//! called without a `this` binding.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use bridge_traits::Fetch;
use bridge_wasm::page::{body_from_js, JsBody};
use core_intercept::PageFetch;
use core_xhr::event::{ABORT, ERROR, LOAD, LOAD_END, LOAD_START, PROGRESS, READY_STATE_CHANGE};
use core_xhr::{Event, EventTarget, LegacyRequest, ListenerId, ResponseBody};
use js_sys::{Array, Function, Reflect, Uint8Array};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Blob, BlobPropertyBag};

const TIMEOUT: &str = "timeout";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsEvent<'a> {
    r#type: &'a str,
    loaded: u64,
    total: u64,
    length_computable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

fn event_to_js(event: &Event) -> JsValue {
    let js_event = JsEvent {
        r#type: &event.event_type,
        loaded: event.loaded,
        total: event.total,
        length_computable: event.length_computable,
        message: event.message.as_deref(),
    };
    js_event
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::UNDEFINED)
}

fn call(callback: &Function, event: &Event) {
    if let Err(err) = callback.call1(&JsValue::UNDEFINED, &event_to_js(event)) {
        warn!(event = %event.event_type, error = ?err, "Request listener threw");
    }
}

fn same_function(a: &Function, b: &Function) -> bool {
    let a: &JsValue = a.as_ref();
    let b: &JsValue = b.as_ref();
    a == b
}

/// JS functions registered on one [`EventTarget`].
#[derive(Clone)]
struct JsListeners {
    target: EventTarget,
    registered: Rc<RefCell<Vec<(String, Function, ListenerId)>>>,
    handlers: Rc<RefCell<HashMap<String, Function>>>,
}

impl JsListeners {
    fn new(target: EventTarget) -> Self {
        Self {
            target,
            registered: Rc::default(),
            handlers: Rc::default(),
        }
    }

    /// A function already registered for `event_type` is not added twice.
    fn add(&self, event_type: &str, listener: Function) {
        let duplicate = self
            .registered
            .borrow()
            .iter()
            .any(|(kind, existing, _)| kind == event_type && same_function(existing, &listener));
        if duplicate {
            return;
        }

        let callback = listener.clone();
        let id = self
            .target
            .add_event_listener(event_type, move |event| call(&callback, event));
        self.registered
            .borrow_mut()
            .push((event_type.to_string(), listener, id));
    }

    fn remove(&self, event_type: &str, listener: &Function) {
        let removed = {
            let mut registered = self.registered.borrow_mut();
            registered
                .iter()
                .position(|(kind, existing, _)| kind == event_type && same_function(existing, listener))
                .map(|index| registered.remove(index))
        };

        if let Some((_, _, id)) = removed {
            self.target.remove_event_listener(event_type, id);
        }
    }

    /// Anything other than a function clears the handler.
    fn set_handler(&self, event_type: &str, value: JsValue) {
        match value.dyn_into::<Function>() {
            Ok(handler) => {
                let callback = handler.clone();
                self.target
                    .set_handler(event_type, move |event| call(&callback, event));
                self.handlers
                    .borrow_mut()
                    .insert(event_type.to_string(), handler);
            }
            Err(_) => {
                self.target.clear_handler(event_type);
                self.handlers.borrow_mut().remove(event_type);
            }
        }
    }

    fn handler(&self, event_type: &str) -> JsValue {
        self.handlers
            .borrow()
            .get(event_type)
            .map(|handler| JsValue::from(handler.clone()))
            .unwrap_or(JsValue::NULL)
    }
}

/// The `upload` sub-object of a [`BridgeXmlHttpRequest`].
#[wasm_bindgen(js_name = BridgeXMLHttpRequestUpload)]
#[derive(Clone)]
pub struct BridgeUpload {
    listeners: JsListeners,
}

#[wasm_bindgen(js_class = BridgeXMLHttpRequestUpload)]
impl BridgeUpload {
    #[wasm_bindgen(js_name = addEventListener)]
    pub fn add_event_listener(&self, event_type: &str, listener: Function) {
        self.listeners.add(event_type, listener);
    }

    #[wasm_bindgen(js_name = removeEventListener)]
    pub fn remove_event_listener(&self, event_type: &str, listener: Function) {
        self.listeners.remove(event_type, &listener);
    }

    #[wasm_bindgen(getter)]
    pub fn onloadstart(&self) -> JsValue {
        self.listeners.handler(LOAD_START)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onloadstart(&self, handler: JsValue) {
        self.listeners.set_handler(LOAD_START, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onprogress(&self) -> JsValue {
        self.listeners.handler(PROGRESS)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onprogress(&self, handler: JsValue) {
        self.listeners.set_handler(PROGRESS, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onabort(&self) -> JsValue {
        self.listeners.handler(ABORT)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onabort(&self, handler: JsValue) {
        self.listeners.set_handler(ABORT, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onloadend(&self) -> JsValue {
        self.listeners.handler(LOAD_END)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onloadend(&self, handler: JsValue) {
        self.listeners.set_handler(LOAD_END, handler);
    }
}

/// Installed as `window.XMLHttpRequest`.
#[wasm_bindgen(js_name = BridgeXMLHttpRequest)]
pub struct BridgeXmlHttpRequest {
    request: LegacyRequest,
    listeners: JsListeners,
    upload: BridgeUpload,
}

impl BridgeXmlHttpRequest {
    /// A request issuing its call through `fetch`.
    pub fn with_fetch(fetch: Arc<dyn Fetch>) -> Self {
        let request = LegacyRequest::new(fetch);
        Self {
            listeners: JsListeners::new(request.events().clone()),
            upload: BridgeUpload {
                listeners: JsListeners::new(request.upload().clone()),
            },
            request,
        }
    }

    /// The request this object drives.
    pub fn request(&self) -> &LegacyRequest {
        &self.request
    }
}

#[wasm_bindgen(js_class = BridgeXMLHttpRequest)]
impl BridgeXmlHttpRequest {
    /// `new XMLHttpRequest()`. Fails until a page has been installed.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<BridgeXmlHttpRequest, JsValue> {
        let page = super::page()
            .ok_or_else(|| js_sys::Error::new("tauri-htmx-bridge is not initialized"))?;
        Ok(Self::with_fetch(page))
    }

    pub fn open(
        &self,
        method: &str,
        url: &str,
        is_async: Option<bool>,
        user: Option<String>,
        password: Option<String>,
    ) {
        self.request.open_with(
            method,
            url,
            is_async.unwrap_or(true),
            user.as_deref(),
            password.as_deref(),
        );
    }

    /// Starts the request and returns at once; progress is reported through
    /// events.
    pub fn send(&self, body: JsValue) {
        let request = self.request.clone();
        spawn_local(async move {
            let body = match body_from_js(&body).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(url = %request.url(), error = %err, "Unreadable request body");
                    request.dispatch_event(Event::error(err.to_string()));
                    request.dispatch_event(Event::new(LOAD_END));
                    return;
                }
            };

            let body = body.map(|JsBody { body, content_type }| {
                let has_content_type = request
                    .request_headers()
                    .keys()
                    .any(|name| name.eq_ignore_ascii_case("content-type"));
                if let (Some(content_type), false) = (content_type, has_content_type) {
                    request.set_request_header("Content-Type", &content_type);
                }
                body
            });

            request.send(body).await;
        });
    }

    pub fn abort(&self) {
        self.request.abort();
    }

    #[wasm_bindgen(js_name = setRequestHeader)]
    pub fn set_request_header(&self, name: &str, value: &str) {
        self.request.set_request_header(name, value);
    }

    #[wasm_bindgen(js_name = getResponseHeader)]
    pub fn get_response_header(&self, name: &str) -> Option<String> {
        self.request.get_response_header(name)
    }

    #[wasm_bindgen(js_name = getAllResponseHeaders)]
    pub fn get_all_response_headers(&self) -> String {
        self.request.get_all_response_headers()
    }

    #[wasm_bindgen(js_name = overrideMimeType)]
    pub fn override_mime_type(&self, mime: &str) {
        self.request.override_mime_type(mime);
    }

    #[wasm_bindgen(js_name = addEventListener)]
    pub fn add_event_listener(&self, event_type: &str, listener: Function) {
        self.listeners.add(event_type, listener);
    }

    #[wasm_bindgen(js_name = removeEventListener)]
    pub fn remove_event_listener(&self, event_type: &str, listener: Function) {
        self.listeners.remove(event_type, &listener);
    }

    #[wasm_bindgen(getter = readyState)]
    pub fn ready_state(&self) -> u8 {
        self.request.ready_state().as_u8()
    }

    #[wasm_bindgen(getter)]
    pub fn status(&self) -> u16 {
        self.request.status()
    }

    #[wasm_bindgen(getter = statusText)]
    pub fn status_text(&self) -> String {
        self.request.status_text()
    }

    #[wasm_bindgen(getter = responseText)]
    pub fn response_text(&self) -> String {
        self.request.response_text()
    }

    #[wasm_bindgen(getter = responseURL)]
    pub fn response_url(&self) -> String {
        self.request.response_url()
    }

    /// Parsed JSON, text, or a `Blob`, by response content type.
    #[wasm_bindgen(getter)]
    pub fn response(&self) -> JsValue {
        match self.request.response() {
            Some(ResponseBody::Text(text)) => JsValue::from_str(&text),
            Some(ResponseBody::Json(value)) => value
                .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                .unwrap_or(JsValue::NULL),
            Some(ResponseBody::Blob(blob)) => {
                blob_to_js(&blob.mime_type, &blob.data).unwrap_or(JsValue::NULL)
            }
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn upload(&self) -> BridgeUpload {
        self.upload.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn onreadystatechange(&self) -> JsValue {
        self.listeners.handler(READY_STATE_CHANGE)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onreadystatechange(&self, handler: JsValue) {
        self.listeners.set_handler(READY_STATE_CHANGE, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onloadstart(&self) -> JsValue {
        self.listeners.handler(LOAD_START)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onloadstart(&self, handler: JsValue) {
        self.listeners.set_handler(LOAD_START, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onprogress(&self) -> JsValue {
        self.listeners.handler(PROGRESS)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onprogress(&self, handler: JsValue) {
        self.listeners.set_handler(PROGRESS, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onload(&self) -> JsValue {
        self.listeners.handler(LOAD)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onload(&self, handler: JsValue) {
        self.listeners.set_handler(LOAD, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onerror(&self) -> JsValue {
        self.listeners.handler(ERROR)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onerror(&self, handler: JsValue) {
        self.listeners.set_handler(ERROR, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onabort(&self) -> JsValue {
        self.listeners.handler(ABORT)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onabort(&self, handler: JsValue) {
        self.listeners.set_handler(ABORT, handler);
    }

    #[wasm_bindgen(getter)]
    pub fn onloadend(&self) -> JsValue {
        self.listeners.handler(LOAD_END)
    }

    #[wasm_bindgen(setter)]
    pub fn set_onloadend(&self, handler: JsValue) {
        self.listeners.set_handler(LOAD_END, handler);
    }

    /// Stored for callers that assign it; requests never time out.
    #[wasm_bindgen(getter)]
    pub fn ontimeout(&self) -> JsValue {
        self.listeners.handler(TIMEOUT)
    }

    #[wasm_bindgen(setter)]
    pub fn set_ontimeout(&self, handler: JsValue) {
        self.listeners.set_handler(TIMEOUT, handler);
    }
}

fn blob_to_js(mime_type: &str, data: &[u8]) -> Result<JsValue, JsValue> {
    let parts = Array::of1(&Uint8Array::from(data));
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options).map(JsValue::from)
}

/// Point `window.XMLHttpRequest` at [`BridgeXmlHttpRequest`].
///
/// wasm-bindgen does not hand the generated class to Rust, so it is read from
/// the `constructor` of a throwaway instance.
pub(crate) fn install_request_class(page: Arc<PageFetch>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_sys::Error::new("window is unavailable"))?;
    let sample = JsValue::from(BridgeXmlHttpRequest::with_fetch(page));
    let class = Reflect::get(&sample, &JsValue::from_str("constructor"))?;
    Reflect::set(&window, &JsValue::from_str("XMLHttpRequest"), &class)?;
    Ok(())
}
