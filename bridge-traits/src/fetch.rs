//! Page Network Primitive Abstraction
//!
//! Models the page's asynchronous `fetch` function: a URL plus a
//! [`RequestInit`] in, a [`FetchResponse`] out. The interceptor implements this
//! trait on top of the host bridge and the legacy request emulator consumes it,
//! so either side can be swapped for a test double.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::descriptor::{RequestBody, DEFAULT_METHOD};
use crate::error::{BridgeError, Result};
use crate::platform::PlatformSendSync;

/// Cross-origin mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

/// Whether credentials accompany the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// Options accepted alongside the URL.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
    pub signal: Option<CancellationToken>,
    pub mode: Option<RequestMode>,
    pub credentials: Option<CredentialsMode>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn credentials(mut self, credentials: CredentialsMode) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// The requested method, or `GET` when none was given.
    pub fn method_or_default(&self) -> &str {
        self.method.as_deref().unwrap_or(DEFAULT_METHOD)
    }

    pub fn is_aborted(&self) -> bool {
        self.signal
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }
}

/// Ordered header collection with case-insensitive names.
///
/// Names are stored lower-cased. Appending an existing name joins the values
/// with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace any existing value for `name`.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn append(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        let name = name.as_ref().to_ascii_lowercase();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => {
                entry.1.push_str(", ");
                entry.1.push_str(value.as_ref());
            }
            None => self.entries.push((name, value.as_ref().to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (key, value) in iter {
            headers.append(key, value);
        }
        headers
    }
}

/// Map order is unspecified, so entries are sorted by name.
impl From<HashMap<String, String>> for Headers {
    fn from(map: HashMap<String, String>) -> Self {
        let mut entries: Vec<_> = map
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        entries.sort();
        entries.into_iter().collect()
    }
}

/// Response handed back to the page.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub url: String,
    pub redirected: bool,
    pub headers: Headers,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: String::new(),
            url: String::new(),
            redirected: false,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Check if response status is successful (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(BridgeError::from)
    }

    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }
}

/// The page's asynchronous network function.
///
/// # Errors
///
/// Implementations return an error when the request cannot be completed at
/// all (transport failure, bridge failure, cancellation). HTTP error statuses
/// are ordinary responses.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Fetch: PlatformSendSync {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse>;
}
