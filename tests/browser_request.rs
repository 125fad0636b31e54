#![cfg(all(feature = "wasm", target_arch = "wasm32"))]
//! Browser tests for the page-facing request class.
//!
//! Run with `wasm-pack test --headless --firefox -- --features wasm`.

use async_trait::async_trait;
use bridge_traits::{error::Result, Fetch, FetchResponse, RequestInit};
use core_intercept::PageFetch;
use js_sys::{Array, Function, Promise, Reflect};
use std::sync::Arc;
use tauri_htmx_bridge::{install_page, BridgeXmlHttpRequest};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

/// Answers with a JSON todo naming the method it was called with.
struct TodoFetch;

#[async_trait(?Send)]
impl Fetch for TodoFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse> {
        Ok(FetchResponse::new(200)
            .with_url(url)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"method":"{}","title":"milk"}}"#,
                init.method_or_default()
            )))
    }
}

fn install() {
    let page = Arc::new(PageFetch::new(Arc::new(TodoFetch)));
    install_page(page).unwrap();
}

#[wasm_bindgen_test]
fn test_window_request_class_is_replaced() {
    install();

    let window = web_sys::window().unwrap();
    let class = Reflect::get(&window, &JsValue::from_str("XMLHttpRequest")).unwrap();
    let name = Reflect::get(&class, &JsValue::from_str("name")).unwrap();
    assert_eq!(name.as_string().as_deref(), Some("BridgeXMLHttpRequest"));

    let instance = Reflect::construct(class.unchecked_ref::<Function>(), &Array::new()).unwrap();
    let ready_state = Reflect::get(&instance, &JsValue::from_str("readyState")).unwrap();
    assert_eq!(ready_state.as_f64(), Some(0.0));
}

#[wasm_bindgen_test]
async fn test_send_reports_through_onload() {
    install();

    let xhr = BridgeXmlHttpRequest::new().unwrap();
    xhr.open("POST", "/todos", Some(true), None, None);
    let loaded = Promise::new(&mut |resolve: Function, _reject: Function| {
        xhr.set_onload(resolve.into());
    });
    xhr.send(JsValue::from_str("title=milk"));

    let event = JsFuture::from(loaded).await.unwrap();
    let event_type = Reflect::get(&event, &JsValue::from_str("type")).unwrap();
    assert_eq!(event_type.as_string().as_deref(), Some("load"));

    assert_eq!(xhr.ready_state(), 4);
    assert_eq!(xhr.status(), 200);
    assert_eq!(xhr.response_url(), "/todos");
    assert_eq!(xhr.response_text(), r#"{"method":"POST","title":"milk"}"#);

    let title = Reflect::get(&xhr.response(), &JsValue::from_str("title")).unwrap();
    assert_eq!(title.as_string().as_deref(), Some("milk"));
}
