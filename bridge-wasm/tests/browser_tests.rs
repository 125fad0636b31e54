#![cfg(target_arch = "wasm32")]
//! Browser tests for the page adapters.
//!
//! Run with `wasm-pack test --headless --firefox bridge-wasm`. The test page
//! has neither the Tauri globals nor htmx loaded, which is what the failure
//! cases rely on.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    DocumentHost, Fetch, FetchResponse, RequestBody, RequestInit,
};
use bridge_wasm::fetch::original_window_fetch;
use bridge_wasm::page::{body_from_js, install_fetch_override, response_to_js};
use bridge_wasm::{TauriInvoker, WebDocument, WindowFetch};
use js_sys::{Reflect, Uint8Array};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Response, UrlSearchParams};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
async fn test_document_is_ready_after_load() {
    let document = WebDocument::new().unwrap();
    document.ready().await.unwrap();
}

#[wasm_bindgen_test]
fn test_replace_root_sets_body() {
    let document = WebDocument::new().unwrap();
    document.replace_root("<main id=\"app\">hi</main>").unwrap();

    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .unwrap();
    assert_eq!(body.inner_html(), "<main id=\"app\">hi</main>");
}

#[wasm_bindgen_test]
fn test_activate_without_htmx_fails() {
    let document = WebDocument::new().unwrap();
    assert!(document.activate_root().is_err());
}

#[wasm_bindgen_test]
fn test_tauri_invoker_requires_global_api() {
    let err = TauriInvoker::new().unwrap_err();
    assert!(matches!(err, BridgeError::NotAvailable(_)));
}

#[wasm_bindgen_test]
async fn test_pre_aborted_fetch_is_rejected() {
    let fetch = WindowFetch::new().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = fetch
        .fetch("/never", RequestInit::new().signal(token))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Aborted));
}

/// Echoes the method and URL back as a 201.
struct EchoFetch;

#[async_trait(?Send)]
impl Fetch for EchoFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse> {
        Ok(FetchResponse::new(201)
            .with_url(url)
            .with_header("content-type", "text/plain")
            .with_header("x-method", init.method_or_default())
            .with_body(format!("bridged {}", url)))
    }
}

#[wasm_bindgen_test]
async fn test_fetch_override_replaces_window_fetch() {
    let window = web_sys::window().unwrap();
    let key = JsValue::from_str("fetch");
    let browser_fetch = Reflect::get(&window, &key).unwrap();

    install_fetch_override(Arc::new(EchoFetch)).unwrap();

    let installed = Reflect::get(&window, &key).unwrap();
    assert_ne!(installed, browser_fetch);
    assert_eq!(JsValue::from(original_window_fetch(&window).unwrap()), browser_fetch);

    let init = web_sys::RequestInit::new();
    init.set_method("POST");
    let response: Response = JsFuture::from(window.fetch_with_str_and_init("/todos", &init))
        .await
        .unwrap()
        .dyn_into()
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.url(), "/todos");
    assert_eq!(
        response.headers().get("x-method").unwrap(),
        Some("POST".to_string())
    );
    let text = JsFuture::from(response.text().unwrap()).await.unwrap();
    assert_eq!(text.as_string().unwrap(), "bridged /todos");
}

#[wasm_bindgen_test]
fn test_response_without_body_status() {
    let response = response_to_js(&FetchResponse::new(204).with_url("/gone")).unwrap();

    assert_eq!(response.status(), 204);
    assert_eq!(response.url(), "/gone");
    assert!(!response.redirected());
}

#[wasm_bindgen_test]
async fn test_form_bodies_are_url_encoded() {
    let params = UrlSearchParams::new_with_str("title=milk&done=false").unwrap();
    let body = body_from_js(&params.into()).await.unwrap().unwrap();

    assert_eq!(body.body, RequestBody::Text("title=milk&done=false".to_string()));
    assert_eq!(
        body.content_type.as_deref(),
        Some("application/x-www-form-urlencoded;charset=UTF-8")
    );
}

#[wasm_bindgen_test]
async fn test_typed_array_body_is_binary() {
    let bytes = Uint8Array::from(&[1u8, 2, 3, 4][..]);
    let view = bytes.subarray(1, 3);
    let body = body_from_js(&view.into()).await.unwrap().unwrap();

    assert_eq!(body.body, RequestBody::Binary(vec![2, 3]));
    assert!(body.content_type.is_none());

    assert!(body_from_js(&JsValue::NULL).await.unwrap().is_none());
}
