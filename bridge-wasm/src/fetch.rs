//! WebAssembly implementation of the `Fetch` bridge trait.
//!
//! Forwards requests to the browser's `window.fetch` and converts the
//! resulting `Response` back into a [`FetchResponse`]. Inside a Tauri webview
//! this is the page's original network function, so it is what reserved
//! `ipc://` URLs end up calling.
//!
//! The function is read from `window` the first time any [`WindowFetch`] is
//! created and kept for the life of the page. Replacing `window.fetch`
//! afterwards (see [`crate::page::install_fetch_override`]) does not change
//! where a `WindowFetch` sends its requests.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    CredentialsMode, Fetch, FetchResponse, Headers, RequestInit, RequestMode,
};
use bytes::Bytes;
use futures::{
    future::{select, Either},
    pin_mut,
};
use js_sys::{try_iter, Array, Function, Promise, Reflect, Uint8Array};
use std::cell::RefCell;
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Request, RequestCredentials, Response, Window};

use crate::error::{WasmError, WasmResult};

thread_local! {
    static ORIGINAL_FETCH: RefCell<Option<Function>> = const { RefCell::new(None) };
}

/// The browser's own `window.fetch`, captured on first use.
pub fn original_window_fetch(window: &Window) -> WasmResult<Function> {
    ORIGINAL_FETCH.with(|slot| {
        if let Some(original) = slot.borrow().as_ref() {
            return Ok(original.clone());
        }

        let original = Reflect::get(window, &JsValue::from_str("fetch"))
            .map_err(|err| WasmError::js("read window.fetch", err))?
            .dyn_into::<Function>()
            .map_err(|_| WasmError::Unavailable("window.fetch".to_string()))?;
        *slot.borrow_mut() = Some(original.clone());
        Ok(original)
    })
}

/// Page fetch backed by the browser's `fetch` API.
pub struct WindowFetch {
    window: Window,
    original: Function,
}

impl WindowFetch {
    /// Bind to the current browser window.
    pub fn new() -> BridgeResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| BridgeError::NotAvailable("window".to_string()))?;
        let original = original_window_fetch(&window)?;
        Ok(Self { window, original })
    }

    fn build_request(
        url: &str,
        init: &RequestInit,
        signal: Option<&web_sys::AbortSignal>,
    ) -> BridgeResult<Request> {
        let request_init = web_sys::RequestInit::new();
        request_init.set_method(init.method_or_default());
        request_init.set_mode(request_mode(init.mode.unwrap_or_default()));
        request_init.set_credentials(credentials_mode(init.credentials.unwrap_or_default()));

        if let Some(signal) = signal {
            request_init.set_signal(Some(signal));
        }

        if let Some(body) = &init.body {
            let body_array = Uint8Array::from(body.as_bytes());
            request_init.set_body(&JsValue::from(body_array));
        }

        let headers =
            web_sys::Headers::new().map_err(|err| WasmError::js("create headers", err))?;
        for (key, value) in &init.headers {
            headers
                .set(key, value)
                .map_err(|err| WasmError::js("set header", err))?;
        }
        request_init.set_headers(&headers);

        Request::new_with_str_and_init(url, &request_init)
            .map_err(|err| WasmError::js("build request", err).into())
    }

    async fn read_body(response: &Response) -> BridgeResult<Bytes> {
        let promise = response
            .array_buffer()
            .map_err(|err| WasmError::js("response.arrayBuffer", err))?;
        let buffer = JsFuture::from(promise)
            .await
            .map_err(|err| WasmError::js("response buffer", err))?;
        let array = Uint8Array::new(&buffer);
        let mut bytes = vec![0u8; array.length() as usize];
        array.copy_to(&mut bytes);
        Ok(Bytes::from(bytes))
    }

    fn collect_headers(response: &Response) -> BridgeResult<Headers> {
        Ok(header_entries(&response.headers())?.into_iter().collect())
    }

    async fn send(&self, request: &Request) -> BridgeResult<Response> {
        let pending = self
            .original
            .call1(&self.window, request)
            .map_err(|err| WasmError::js("fetch", err))?;
        let value = JsFuture::from(Promise::resolve(&pending))
            .await
            .map_err(|err| WasmError::js("fetch", err))?;
        value
            .dyn_into::<Response>()
            .map_err(|_| BridgeError::OperationFailed("fetch returned non-Response".into()))
    }
}

#[async_trait(?Send)]
impl Fetch for WindowFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> BridgeResult<FetchResponse> {
        if init.is_aborted() {
            return Err(BridgeError::Aborted);
        }

        let controller = match init.signal {
            Some(_) => Some(
                AbortController::new()
                    .map_err(|err| WasmError::js("create abort controller", err))?,
            ),
            None => None,
        };
        let signal = controller.as_ref().map(AbortController::signal);
        let request = Self::build_request(url, &init, signal.as_ref())?;

        let response = match (&init.signal, &controller) {
            (Some(token), Some(controller)) => {
                let cancelled = token.cancelled();
                let call = self.send(&request);
                pin_mut!(cancelled);
                pin_mut!(call);

                match select(cancelled, call).await {
                    Either::Left(_) => {
                        controller.abort();
                        debug!(url, "Window fetch aborted");
                        return Err(BridgeError::Aborted);
                    }
                    Either::Right((result, _)) => result?,
                }
            }
            _ => self.send(&request).await?,
        };

        let headers = Self::collect_headers(&response)?;
        let body = Self::read_body(&response).await?;

        let mut fetched = FetchResponse::new(response.status())
            .with_status_text(response.status_text())
            .with_url(response.url())
            .with_headers(headers)
            .with_body(body);
        fetched.redirected = response.redirected();
        Ok(fetched)
    }
}

/// `(name, value)` pairs of a browser `Headers` object, in iteration order.
pub(crate) fn header_entries(headers: &web_sys::Headers) -> WasmResult<Vec<(String, String)>> {
    let iterator = try_iter(headers)
        .map_err(|err| WasmError::js("iterate headers", err))?
        .ok_or_else(|| WasmError::Unavailable("Headers iterator".to_string()))?;

    let mut entries = Vec::new();
    for entry in iterator {
        let entry = entry.map_err(|err| WasmError::js("header iteration", err))?;
        let pair = Array::from(&entry);
        if let (Some(key), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
            entries.push((key, value));
        }
    }

    Ok(entries)
}

fn request_mode(mode: RequestMode) -> web_sys::RequestMode {
    match mode {
        RequestMode::Cors => web_sys::RequestMode::Cors,
        RequestMode::NoCors => web_sys::RequestMode::NoCors,
        RequestMode::SameOrigin => web_sys::RequestMode::SameOrigin,
        RequestMode::Navigate => web_sys::RequestMode::Navigate,
    }
}

fn credentials_mode(credentials: CredentialsMode) -> RequestCredentials {
    match credentials {
        CredentialsMode::Omit => RequestCredentials::Omit,
        CredentialsMode::SameOrigin => RequestCredentials::SameOrigin,
        CredentialsMode::Include => RequestCredentials::Include,
    }
}
