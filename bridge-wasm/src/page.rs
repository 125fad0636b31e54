//! Page-global override of `window.fetch`.
//!
//! [`install_fetch_override`] points `window.fetch` at a Rust [`Fetch`], so
//! every script on the page that calls `fetch(input, init)` goes through it.
//! The JS arguments are read into a URL plus [`RequestInit`], and the
//! [`FetchResponse`] comes back to the caller as a browser `Response` whose
//! `url` and `redirected` reflect the bridged call.
//!
//! The conversion helpers are public so other page-facing objects (the
//! legacy request class) read bodies the same way.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_traits::{
    error::BridgeError, CredentialsMode, Fetch, FetchResponse, RequestBody, RequestInit,
    RequestMode,
};
use js_sys::{ArrayBuffer, Object, Promise, Reflect, Uint8Array};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    AbortSignal, AddEventListenerOptions, Blob, DomException, FormData, Request, Response,
    ResponseInit, UrlSearchParams,
};

use crate::error::{WasmError, WasmResult};
use crate::fetch::{header_entries, original_window_fetch};

/// Statuses a browser `Response` refuses to pair with a body.
const NULL_BODY_STATUSES: [u16; 5] = [101, 103, 204, 205, 304];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// A request body read from a JS value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsBody {
    /// The payload
    pub body: RequestBody,
    /// Content type implied by the body's JS type, as a browser would send
    /// it when the caller sets none.
    pub content_type: Option<String>,
}

/// Replace `window.fetch` with a function that calls `fetch`.
///
/// The browser's own fetch is captured first, so [`crate::WindowFetch`]
/// instances keep reaching the network. Installing again replaces the
/// previous override.
pub fn install_fetch_override(fetch: Arc<dyn Fetch>) -> WasmResult<()> {
    let window =
        web_sys::window().ok_or_else(|| WasmError::Unavailable("window".to_string()))?;
    original_window_fetch(&window)?;

    let replacement = Closure::<dyn Fn(JsValue, JsValue) -> Promise>::new(
        move |input: JsValue, init: JsValue| {
            let fetch = Arc::clone(&fetch);
            future_to_promise(async move {
                let (url, init) = request_from_js(&input, &init)
                    .await
                    .map_err(type_error)?;

                match fetch.fetch(&url, init).await {
                    Ok(response) => response_to_js(&response)
                        .map(JsValue::from)
                        .map_err(type_error),
                    Err(BridgeError::Aborted) => {
                        debug!(url = %url, "Page fetch aborted");
                        Err(abort_error())
                    }
                    Err(err) => Err(js_sys::TypeError::new(&err.to_string()).into()),
                }
            })
        },
    );

    Reflect::set(&window, &JsValue::from_str("fetch"), replacement.as_ref())
        .map_err(|err| WasmError::js("install window.fetch", err))?;
    // The page keeps calling it until unload
    replacement.forget();

    info!("window.fetch routed through the bridge");
    Ok(())
}

/// Read the arguments of a `fetch(input, init)` call.
///
/// `input` may be a string, a `Request` or anything with a string form (a
/// `URL`). Fields present in `init` override those taken from a `Request`.
pub async fn request_from_js(input: &JsValue, init: &JsValue) -> WasmResult<(String, RequestInit)> {
    let mut request_init = RequestInit::new();

    let url = if let Some(url) = input.as_string() {
        url
    } else if let Some(request) = input.dyn_ref::<Request>() {
        request_init.method = Some(request.method());
        request_init.headers = header_map(&request.headers())?;
        request_init.signal = Some(token_for(&request.signal())?);
        request_init.body = request_body(request).await?;
        request.url()
    } else {
        String::from(input.unchecked_ref::<Object>().to_string())
    };

    if init.is_object() {
        if let Some(method) = get(init, "method")?.as_string() {
            request_init.method = Some(method);
        }

        let headers = get(init, "headers")?;
        if !headers.is_undefined() && !headers.is_null() {
            request_init.headers = header_map(&to_headers(&headers)?)?;
        }

        if let Some(JsBody { body, content_type }) = body_from_js(&get(init, "body")?).await? {
            if let Some(content_type) = content_type {
                if !request_init
                    .headers
                    .keys()
                    .any(|name| name.eq_ignore_ascii_case("content-type"))
                {
                    request_init.headers.insert("content-type".to_string(), content_type);
                }
            }
            request_init.body = Some(body);
        }

        if let Some(mode) = get(init, "mode")?.as_string() {
            request_init.mode = parse_mode(&mode);
        }
        if let Some(credentials) = get(init, "credentials")?.as_string() {
            request_init.credentials = parse_credentials(&credentials);
        }
        if let Some(signal) = get(init, "signal")?.dyn_ref::<AbortSignal>() {
            request_init.signal = Some(token_for(signal)?);
        }
    }

    Ok((url, request_init))
}

/// Read a request body passed from JS.
///
/// Strings are sent as text. `ArrayBuffer`, typed arrays and `Blob`s are sent
/// as bytes. `URLSearchParams` and `FormData` are form-encoded (file entries
/// of a `FormData` contribute only their name). Anything else is sent as its
/// string form. `null` and `undefined` mean no body.
pub async fn body_from_js(value: &JsValue) -> WasmResult<Option<JsBody>> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }

    let (body, content_type) = if let Some(text) = value.as_string() {
        (RequestBody::Text(text), None)
    } else if let Some(blob) = value.dyn_ref::<Blob>() {
        let buffer = JsFuture::from(blob.array_buffer())
            .await
            .map_err(|err| WasmError::js("blob.arrayBuffer", err))?;
        let mime = blob.type_();
        (
            RequestBody::Binary(Uint8Array::new(&buffer).to_vec()),
            (!mime.is_empty()).then_some(mime),
        )
    } else if value.is_instance_of::<ArrayBuffer>() {
        (RequestBody::Binary(Uint8Array::new(value).to_vec()), None)
    } else if ArrayBuffer::is_view(value) {
        (RequestBody::Binary(view_bytes(value)?), None)
    } else if value.is_instance_of::<UrlSearchParams>() {
        let params = value.unchecked_ref::<UrlSearchParams>();
        (
            RequestBody::Text(String::from(params.to_string())),
            Some(FORM_CONTENT_TYPE.to_string()),
        )
    } else if value.is_instance_of::<FormData>() {
        let params = UrlSearchParams::new_with_str_sequence_sequence(value)
            .map_err(|err| WasmError::js("encode FormData", err))?;
        (
            RequestBody::Text(String::from(params.to_string())),
            Some(FORM_CONTENT_TYPE.to_string()),
        )
    } else {
        let text = value.unchecked_ref::<Object>().to_string();
        (RequestBody::Text(String::from(text)), None)
    };

    Ok(Some(JsBody { body, content_type }))
}

/// Build the browser `Response` handed back to a page script.
pub fn response_to_js(response: &FetchResponse) -> WasmResult<Response> {
    let headers =
        web_sys::Headers::new().map_err(|err| WasmError::js("create headers", err))?;
    for (name, value) in response.headers.iter() {
        headers
            .append(name, value)
            .map_err(|err| WasmError::js("append header", err))?;
    }

    let init = ResponseInit::new();
    init.set_status(response.status);
    init.set_status_text(&response.status_text);
    init.set_headers(&headers);

    let built = if NULL_BODY_STATUSES.contains(&response.status) {
        Response::new_with_opt_buffer_source_and_init(None, &init)
    } else {
        let body = Uint8Array::from(&response.body[..]);
        Response::new_with_opt_buffer_source_and_init(Some(&*body), &init)
    }
    .map_err(|err| WasmError::js("build Response", err))?;

    // `url` and `redirected` are read-only on a constructed Response
    define_value(&built, "url", &JsValue::from_str(&response.url));
    define_value(&built, "redirected", &JsValue::from_bool(response.redirected));

    Ok(built)
}

fn get(target: &JsValue, key: &str) -> WasmResult<JsValue> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(|err| WasmError::js(key, err))
}

fn define_value(target: &Object, name: &str, value: &JsValue) {
    let descriptor = Object::new();
    // Setting a key on a fresh plain object cannot fail
    let _ = Reflect::set(&descriptor, &JsValue::from_str("value"), value);
    Object::define_property(target, &JsValue::from_str(name), &descriptor);
}

fn to_headers(value: &JsValue) -> WasmResult<web_sys::Headers> {
    if let Some(headers) = value.dyn_ref::<web_sys::Headers>() {
        return Ok(headers.clone());
    }

    let built = if js_sys::Array::is_array(value) {
        web_sys::Headers::new_with_str_sequence_sequence(value)
    } else {
        web_sys::Headers::new_with_record_from_str_to_str(value.unchecked_ref::<Object>())
    };
    built.map_err(|err| WasmError::js("read headers", err))
}

fn header_map(headers: &web_sys::Headers) -> WasmResult<HashMap<String, String>> {
    Ok(header_entries(headers)?.into_iter().collect())
}

async fn request_body(request: &Request) -> WasmResult<Option<RequestBody>> {
    if matches!(request.method().as_str(), "GET" | "HEAD") {
        return Ok(None);
    }

    let promise = request
        .array_buffer()
        .map_err(|err| WasmError::js("request.arrayBuffer", err))?;
    let buffer = JsFuture::from(promise)
        .await
        .map_err(|err| WasmError::js("request body", err))?;
    let bytes = Uint8Array::new(&buffer).to_vec();

    Ok((!bytes.is_empty()).then_some(RequestBody::Binary(bytes)))
}

fn view_bytes(view: &JsValue) -> WasmResult<Vec<u8>> {
    let buffer = get(view, "buffer")?;
    let offset = get(view, "byteOffset")?.as_f64().unwrap_or(0.0) as u32;
    let length = get(view, "byteLength")?.as_f64().unwrap_or(0.0) as u32;
    Ok(Uint8Array::new_with_byte_offset_and_length(&buffer, offset, length).to_vec())
}

/// Cancellation token that follows `signal`.
fn token_for(signal: &AbortSignal) -> WasmResult<CancellationToken> {
    let token = CancellationToken::new();
    if signal.aborted() {
        token.cancel();
        return Ok(token);
    }

    let options = AddEventListenerOptions::new();
    options.set_once(true);
    let on_abort = {
        let token = token.clone();
        Closure::once_into_js(move || token.cancel())
    };
    signal
        .add_event_listener_with_callback_and_add_event_listener_options(
            "abort",
            on_abort.unchecked_ref(),
            &options,
        )
        .map_err(|err| WasmError::js("watch abort signal", err))?;

    Ok(token)
}

fn parse_mode(mode: &str) -> Option<RequestMode> {
    match mode {
        "cors" => Some(RequestMode::Cors),
        "no-cors" => Some(RequestMode::NoCors),
        "same-origin" => Some(RequestMode::SameOrigin),
        "navigate" => Some(RequestMode::Navigate),
        _ => None,
    }
}

fn parse_credentials(credentials: &str) -> Option<CredentialsMode> {
    match credentials {
        "omit" => Some(CredentialsMode::Omit),
        "same-origin" => Some(CredentialsMode::SameOrigin),
        "include" => Some(CredentialsMode::Include),
        _ => None,
    }
}

fn type_error(err: WasmError) -> JsValue {
    js_sys::TypeError::new(&err.to_string()).into()
}

fn abort_error() -> JsValue {
    DomException::new_with_message_and_name("The operation was aborted.", "AbortError")
        .map(JsValue::from)
        .unwrap_or_else(|err| err)
}
