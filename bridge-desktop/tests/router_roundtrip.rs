//! Page-side requests carried through the interceptor into an Axum router.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::{Json, Router};
use bridge_desktop::{ReqwestFetch, RouterInvoker};
use bridge_traits::{Fetch, RequestInit};
use core_intercept::PageFetch;
use core_runtime::config::BridgeConfig;
use core_xhr::{LegacyRequest, ReadyState};
use serde::Serialize;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

type Todos = Arc<Mutex<Vec<String>>>;

#[derive(Serialize)]
struct TodoList {
    items: Vec<String>,
}

async fn list_todos(State(todos): State<Todos>, headers: HeaderMap) -> impl IntoResponse {
    let items = todos.lock().unwrap().clone();
    let fragment = headers.contains_key("hx-request");
    let html = items
        .iter()
        .map(|item| format!("<li>{}</li>", item))
        .collect::<String>();
    if fragment {
        Html(html)
    } else {
        Html(format!("<ul>{}</ul>", html))
    }
}

async fn create_todo(State(todos): State<Todos>, body: String) -> impl IntoResponse {
    match body.strip_prefix("title=") {
        Some(title) if !title.is_empty() => {
            todos.lock().unwrap().push(title.to_string());
            Redirect::to("/todos").into_response()
        }
        _ => (StatusCode::UNPROCESSABLE_ENTITY, "title required").into_response(),
    }
}

async fn todos_json(State(todos): State<Todos>) -> Json<TodoList> {
    Json(TodoList {
        items: todos.lock().unwrap().clone(),
    })
}

fn app(todos: Todos) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos.json", get(todos_json))
        .route("/old", get(|| async { Redirect::permanent("/todos") }))
        .with_state(todos)
}

fn page(todos: Todos) -> PageFetch {
    let page = PageFetch::new(Arc::new(ReqwestFetch::new().unwrap()));
    page.install_interceptor(Arc::new(RouterInvoker::new(app(todos))), BridgeConfig::default());
    page
}

#[tokio::test]
async fn test_post_redirects_to_listing() {
    let todos: Todos = Arc::new(Mutex::new(vec!["eggs".to_string()]));
    let page = page(todos.clone());

    let response = page
        .fetch(
            "/todos",
            RequestInit::new()
                .method("POST")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body("title=milk"),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.redirected);
    assert_eq!(response.url, "/todos");
    assert_eq!(response.text(), "<ul><li>eggs</li><li>milk</li></ul>");
    assert_eq!(todos.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_permanent_redirect_is_followed() {
    let page = page(Arc::new(Mutex::new(vec!["a".to_string()])));

    let response = page.fetch("/old", RequestInit::new()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "<ul><li>a</li></ul>");
}

#[tokio::test]
async fn test_validation_error_status_passes_through() {
    let page = page(Arc::new(Mutex::new(Vec::new())));

    let response = page
        .fetch("/todos", RequestInit::new().method("POST").body("title="))
        .await
        .unwrap();

    assert_eq!(response.status, 422);
    assert!(!response.ok());
    assert_eq!(response.text(), "title required");
}

#[tokio::test]
async fn test_request_headers_reach_router() {
    let page = page(Arc::new(Mutex::new(vec!["x".to_string()])));

    let response = page
        .fetch("/todos", RequestInit::new().header("HX-Request", "true"))
        .await
        .unwrap();

    assert_eq!(response.text(), "<li>x</li>");
    assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
}

#[tokio::test]
async fn test_legacy_request_over_router() {
    let page: Arc<PageFetch> = Arc::new(page(Arc::new(Mutex::new(vec!["tea".to_string()]))));
    let request = LegacyRequest::new(page);

    let loaded = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&loaded);
    request.set_handler("load", move |_| *flag.borrow_mut() = true);

    request.open("GET", "/todos.json");
    request.send(None).await;

    assert!(*loaded.borrow());
    assert_eq!(request.ready_state(), ReadyState::Done);
    assert_eq!(request.status(), 200);
    assert_eq!(request.response().unwrap().as_json(), Some(&json!({"items": ["tea"]})));
    assert_eq!(request.get_response_header("Content-Type").as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_unregistered_command_surfaces_as_error() {
    let page = PageFetch::new(Arc::new(ReqwestFetch::new().unwrap()));
    let config = BridgeConfig::builder().command("todo_request").build().unwrap();
    page.install_interceptor(Arc::new(RouterInvoker::new(app(Arc::default()))), config);

    let err = page.fetch("/todos", RequestInit::new()).await.unwrap_err();

    assert!(err.to_string().contains("todo_request"));
}
