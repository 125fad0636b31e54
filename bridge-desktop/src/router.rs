//! Host side of the bridge: request descriptors executed against an Axum
//! router.
//!
//! In a Tauri application the registered command receives a
//! [`LocalRequest`], and [`RouterInvoker::send`] turns it into an
//! `http::Request`, drives it through the router and collects the response
//! into a [`LocalResponse`]. [`RouterInvoker`] also implements
//! [`HostInvoker`] so the page side can be exercised in-process without a
//! webview.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Method, Request};
use axum::response::Response;
use axum::Router;
use bridge_traits::{
    error::{BridgeError, Result},
    HostInvoker, InvokeArgs, LocalRequest, LocalResponse, DEFAULT_COMMAND,
};
use std::collections::HashMap;
use thiserror::Error;
use tower::ServiceExt;
use tracing::{debug, warn};

/// Why a descriptor could not be turned into an `http::Request`.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Could not parse method from LocalRequest: {0}")]
    Method(String),

    #[error("Could not build request from LocalRequest: {0}")]
    Build(#[from] http::Error),
}

/// Convert a descriptor into a request the router accepts.
///
/// Methods are matched case-insensitively against GET, POST, PUT, DELETE,
/// PATCH, HEAD and OPTIONS.
pub fn to_http_request(request: &LocalRequest) -> std::result::Result<Request<Body>, DescriptorError> {
    let method = match request.method.to_ascii_uppercase().as_str() {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "DELETE" => Method::DELETE,
        "PATCH" => Method::PATCH,
        "HEAD" => Method::HEAD,
        "OPTIONS" => Method::OPTIONS,
        _ => return Err(DescriptorError::Method(request.method.clone())),
    };

    let mut builder = Request::builder().method(method).uri(request.uri.as_str());
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let body = match &request.body {
        Some(body) => Body::from(body.as_bytes().to_vec()),
        None => Body::empty(),
    };

    Ok(builder.body(body)?)
}

/// Collect a router response into a descriptor.
///
/// Header names come out lower-cased. Values that are not visible ASCII are
/// decoded lossily. A body that fails to collect yields an empty body with
/// the original status.
pub async fn from_response(response: Response) -> LocalResponse {
    let (parts, body) = response.into_parts();

    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in parts.headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            warn!(status = parts.status.as_u16(), error = %e, "Failed to collect response body");
            Vec::new()
        }
    };

    LocalResponse {
        status_code: parts.status.as_u16(),
        headers,
        body,
    }
}

/// In-process host that answers bridge commands with an Axum router.
///
/// Accepts [`DEFAULT_COMMAND`] plus any command added with
/// [`RouterInvoker::with_command`]. Redirect follow-ups from the page arrive
/// on the default command, so it stays registered.
#[derive(Clone)]
pub struct RouterInvoker {
    router: Router,
    commands: Vec<String>,
}

impl RouterInvoker {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            commands: vec![DEFAULT_COMMAND.to_string()],
        }
    }

    /// Also answer `command`.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        let command = command.into();
        if !self.commands.contains(&command) {
            self.commands.push(command);
        }
        self
    }

    pub fn accepts(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }

    /// Execute one descriptor against the router.
    ///
    /// Never fails: conversion and router errors become a 500 descriptor.
    pub async fn send(&self, request: LocalRequest) -> LocalResponse {
        let http_request = match to_http_request(&request) {
            Ok(http_request) => http_request,
            Err(e) => {
                warn!(method = %request.method, uri = %request.uri, error = %e, "Rejected request descriptor");
                return LocalResponse::internal_server_error(e);
            }
        };

        let response = match self.router.clone().oneshot(http_request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let response = from_response(response).await;
        debug!(
            method = %request.method,
            uri = %request.uri,
            status = response.status_code,
            "Router handled request"
        );
        response
    }
}

#[async_trait]
impl HostInvoker for RouterInvoker {
    async fn invoke(&self, command: &str, args: InvokeArgs) -> Result<LocalResponse> {
        if !self.accepts(command) {
            return Err(BridgeError::invoke_failed(command, "command not registered"));
        }
        Ok(self.send(args.local_request).await)
    }
}
