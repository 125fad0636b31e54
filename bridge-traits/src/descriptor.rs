//! Request and response descriptors exchanged across the host bridge.
//!
//! A [`LocalRequest`] is what the page side serializes for every intercepted
//! request; a [`LocalResponse`] is what the host hands back after running the
//! request through its in-process server. Both are plain serde values so they
//! can cross the IPC boundary as JSON.

use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Method used when the caller does not name one.
pub const DEFAULT_METHOD: &str = "GET";

/// Status codes the page side treats as redirects and follows itself.
pub const REDIRECT_STATUS_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// Request payload, either text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Text(String),
    Binary(Vec<u8>),
}

impl RequestBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RequestBody::Text(text) => text.as_bytes(),
            RequestBody::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RequestBody::Text(text) => text.into_bytes(),
            RequestBody::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Binary(bytes)
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Binary(bytes.to_vec())
    }
}

/// Represents an HTTP request that the host forwards to its local server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRequest {
    pub uri: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

impl LocalRequest {
    /// A `GET` descriptor with no headers and no body.
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: default_method(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Represents an HTTP response produced by the host's local server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalResponse {
    #[serde(deserialize_with = "deserialize_status_code")]
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Vec<u8>,
}

impl LocalResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_redirect(&self) -> bool {
        REDIRECT_STATUS_CODES.contains(&self.status_code)
    }

    /// 500 response carrying the error text as its body.
    pub fn internal_server_error(error: impl std::fmt::Display) -> Self {
        let error_message = format!("An error occured: {}", error);
        Self::new(500).with_body(error_message)
    }
}

/// Hosts written against loosely typed runtimes report the status either as a
/// number or as its decimal string.
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StatusRepr {
        Number(u16),
        Text(String),
    }

    match StatusRepr::deserialize(deserializer)? {
        StatusRepr::Number(code) => Ok(code),
        StatusRepr::Text(text) => text
            .trim()
            .parse::<u16>()
            .map_err(|_| de::Error::custom(format!("invalid status code `{}`", text))),
    }
}

/// Named argument object for a bridge command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeArgs {
    pub local_request: LocalRequest,
}

impl InvokeArgs {
    pub fn new(local_request: LocalRequest) -> Self {
        Self { local_request }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults_when_fields_missing() {
        let request: LocalRequest = serde_json::from_value(json!({ "uri": "/items" })).unwrap();

        assert_eq!(request.method, "GET");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_request_body_omitted_when_absent() {
        let value = serde_json::to_value(LocalRequest::get("/")).unwrap();
        assert!(value.get("body").is_none());

        let value = serde_json::to_value(LocalRequest::get("/").with_body("x=1")).unwrap();
        assert_eq!(value["body"], json!("x=1"));
    }

    #[test]
    fn test_invoke_args_use_camel_case() {
        let value = serde_json::to_value(InvokeArgs::new(LocalRequest::get("/a"))).unwrap();
        assert_eq!(value["localRequest"]["uri"], json!("/a"));
    }

    #[test]
    fn test_status_code_accepts_number_and_string() {
        let numeric: LocalResponse =
            serde_json::from_value(json!({ "status_code": 201, "headers": {}, "body": [] }))
                .unwrap();
        let textual: LocalResponse =
            serde_json::from_value(json!({ "status_code": "404", "headers": {}, "body": [] }))
                .unwrap();

        assert_eq!(numeric.status_code, 201);
        assert_eq!(textual.status_code, 404);
    }

    #[test]
    fn test_status_code_rejects_garbage() {
        let result: std::result::Result<LocalResponse, _> =
            serde_json::from_value(json!({ "status_code": "ok", "headers": {}, "body": [] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = LocalResponse::new(302).with_header("Location", "/next");

        assert_eq!(response.header("location"), Some("/next"));
        assert_eq!(response.header("LOCATION"), Some("/next"));
        assert!(response.is_redirect());
    }

    #[test]
    fn test_internal_server_error() {
        let response = LocalResponse::internal_server_error("Test error");

        assert_eq!(response.status_code, 500);
        assert_eq!(
            String::from_utf8(response.body).unwrap(),
            "An error occured: Test error"
        );
    }
}
