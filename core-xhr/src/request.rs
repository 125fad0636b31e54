//! Legacy request object built on the asynchronous fetch primitive.
//!
//! [`LegacyRequest`] drives its own readiness state machine around a single
//! `fetch` call:
//!
//! ```text
//! new() ──> UNSENT ──open()──> OPENED ──send()──> SENT
//!                                                  │ response headers
//!                                                  v
//!                     DONE <──body decoded── HEADERS_PARSED
//! ```
//!
//! `abort()` returns to `UNSENT` from any state. A failed fetch (or a body
//! that does not decode) fires `error` and leaves the state where it was.
//!
//! All handles are single-threaded (`Rc`), matching the page's event loop.
//! State borrows are released before any listener runs, so listeners may call
//! back into the request.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    CredentialsMode, Fetch, FetchResponse, Headers, RequestBody, RequestInit, RequestMode,
    DEFAULT_METHOD,
};
use futures::future::{select, Either};
use futures::pin_mut;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::body::ResponseBody;
use crate::error::XhrError;
use crate::event::{
    relays_to_upload, Event, EventTarget, ListenerId, ABORT, LOAD, LOAD_END, LOAD_START,
    PROGRESS, READY_STATE_CHANGE,
};
use crate::ready_state::ReadyState;

struct RequestState {
    ready_state: ReadyState,
    method: String,
    url: String,
    is_async: bool,
    user: Option<String>,
    password: Option<String>,
    request_headers: HashMap<String, String>,
    response_headers: Headers,
    status: u16,
    status_text: String,
    response_url: String,
    response: Option<ResponseBody>,
    response_text: String,
    mime_override: Option<String>,
    abort_handle: CancellationToken,
    in_flight: bool,
}

impl Default for RequestState {
    fn default() -> Self {
        Self {
            ready_state: ReadyState::Unsent,
            method: DEFAULT_METHOD.to_string(),
            url: String::new(),
            is_async: true,
            user: None,
            password: None,
            request_headers: HashMap::new(),
            response_headers: Headers::new(),
            status: 0,
            status_text: String::new(),
            response_url: String::new(),
            response: None,
            response_text: String::new(),
            mime_override: None,
            abort_handle: CancellationToken::new(),
            in_flight: false,
        }
    }
}

impl RequestState {
    fn clear_response(&mut self) {
        self.response_headers = Headers::new();
        self.status = 0;
        self.status_text.clear();
        self.response_url.clear();
        self.response = None;
        self.response_text.clear();
    }
}

/// Event-driven request object.
///
/// Clones share the same request, the same listeners and the same upload
/// target.
#[derive(Clone)]
pub struct LegacyRequest {
    fetch: Arc<dyn Fetch>,
    state: Rc<RefCell<RequestState>>,
    events: EventTarget,
    upload: EventTarget,
}

impl LegacyRequest {
    /// Create a request that will issue its call through `fetch`.
    ///
    /// A `readystatechange` is dispatched immediately. Nothing can be
    /// listening yet, so it is never observed.
    pub fn new(fetch: Arc<dyn Fetch>) -> Self {
        let request = Self {
            fetch,
            state: Rc::new(RefCell::new(RequestState::default())),
            events: EventTarget::new(),
            upload: EventTarget::new(),
        };
        request.dispatch_event(Event::new(READY_STATE_CHANGE));
        request
    }

    pub fn open(&self, method: &str, url: &str) {
        self.open_with(method, url, true, None, None);
    }

    /// Record the request target and credentials and move to `OPENED`.
    ///
    /// `is_async = false` is recorded but execution stays asynchronous.
    pub fn open_with(
        &self,
        method: &str,
        url: &str,
        is_async: bool,
        user: Option<&str>,
        password: Option<&str>,
    ) {
        {
            let mut state = self.state.borrow_mut();
            state.method = method.to_string();
            state.url = url.to_string();
            state.is_async = is_async;
            state.user = user.filter(|u| !u.is_empty()).map(str::to_string);
            state.password = password.filter(|p| !p.is_empty()).map(str::to_string);
            // A send still in flight for the previous open() goes quiet
            state.abort_handle.cancel();
            state.abort_handle = CancellationToken::new();
            state.in_flight = false;
            state.clear_response();
            state.ready_state = ReadyState::Opened;
        }

        if !is_async {
            debug!(url, "Synchronous mode requested, running asynchronously");
        }
        debug!(method, url, "Request opened");
        self.dispatch_event(Event::new(READY_STATE_CHANGE));
    }

    /// Issue the request and drive it to completion.
    ///
    /// The returned future resolves once the request has finished, failed or
    /// been aborted; outcomes are reported through events, never returned.
    pub async fn send(&self, body: Option<RequestBody>) {
        let (url, init, token) = self.prepare(body);

        self.dispatch_event(Event::new(READY_STATE_CHANGE));
        self.dispatch_event(Event::new(LOAD_START));

        let fetch = Arc::clone(&self.fetch);
        let outcome = {
            let cancelled = token.cancelled();
            let request = fetch.fetch(&url, init);
            pin_mut!(cancelled);
            pin_mut!(request);

            match select(cancelled, request).await {
                Either::Left(_) => None,
                Either::Right((result, _)) => Some(result),
            }
        };

        let result = match outcome {
            Some(result) if !token.is_cancelled() => result,
            _ => {
                debug!(url = %url, "Request aborted before response");
                return;
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.fail(XhrError::Fetch(err));
                return;
            }
        };

        self.receive_headers(&response);
        self.dispatch_event(Event::new(READY_STATE_CHANGE));
        if token.is_cancelled() {
            return;
        }

        let content_type = response.content_type().unwrap_or_default().to_string();
        match ResponseBody::decode(&content_type, response.body.clone()) {
            Ok(body) => self.complete(body, response.body.len() as u64, &token),
            Err(err) => self.fail(err),
        }
    }

    /// Cancel any in-flight request and return to `UNSENT`.
    ///
    /// The cancellation is cooperative: the underlying fetch is signalled and
    /// this request stops reacting to it, but the fetch itself may still run
    /// to completion.
    pub fn abort(&self) {
        let was_in_flight = {
            let mut state = self.state.borrow_mut();
            state.abort_handle.cancel();
            state.ready_state = ReadyState::Unsent;
            std::mem::replace(&mut state.in_flight, false)
        };

        debug!(was_in_flight, "Request aborted");
        self.dispatch_event(Event::new(READY_STATE_CHANGE));
        if was_in_flight {
            self.dispatch_event(Event::new(ABORT));
            self.dispatch_event(Event::new(LOAD_END));
        }
    }

    fn prepare(&self, body: Option<RequestBody>) -> (String, RequestInit, CancellationToken) {
        let mut state = self.state.borrow_mut();

        let mut headers = state.request_headers.clone();
        if let (Some(user), Some(password)) = (&state.user, &state.password) {
            let credentials = STANDARD.encode(format!("{}:{}", user, password));
            headers.insert("Authorization".to_string(), format!("Basic {}", credentials));
        }

        let credentials = if state.user.is_some() || state.password.is_some() {
            CredentialsMode::Include
        } else {
            CredentialsMode::SameOrigin
        };

        let token = state.abort_handle.clone();
        let init = RequestInit {
            method: Some(state.method.clone()),
            headers,
            body,
            signal: Some(token.clone()),
            mode: Some(RequestMode::Cors),
            credentials: Some(credentials),
        };

        state.ready_state = ReadyState::Sent;
        state.in_flight = true;
        debug!(method = %state.method, url = %state.url, "Request sent");

        (state.url.clone(), init, token)
    }

    fn receive_headers(&self, response: &FetchResponse) {
        let mut state = self.state.borrow_mut();
        state.status = response.status;
        state.status_text = response.status_text.clone();
        state.response_url = response.url.clone();
        state.response_headers = response
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect();
        state.ready_state = ReadyState::HeadersParsed;
        debug!(status = response.status, url = %state.url, "Response headers parsed");
    }

    fn complete(&self, body: ResponseBody, length: u64, token: &CancellationToken) {
        self.dispatch_event(Event::progress(PROGRESS, length, Some(length)));
        if token.is_cancelled() {
            return;
        }

        {
            let mut state = self.state.borrow_mut();
            state.response_text = body.to_response_text();
            state.response = Some(body);
            state.ready_state = ReadyState::Done;
            state.in_flight = false;
        }

        self.dispatch_event(Event::new(READY_STATE_CHANGE));
        self.dispatch_event(Event::new(LOAD));
        self.dispatch_event(Event::progress(LOAD_END, length, Some(length)));
    }

    /// Failure path: `error` then `loadend`, no state change.
    fn fail(&self, err: XhrError) {
        let url = {
            let mut state = self.state.borrow_mut();
            state.in_flight = false;
            state.url.clone()
        };

        warn!(url = %url, error = %err, "Request failed");
        self.dispatch_event(Event::error(err.to_string()));
        self.dispatch_event(Event::new(LOAD_END));
    }

    /// Merge a request header. Allowed in every state.
    pub fn set_request_header(&self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .request_headers
            .insert(name.to_string(), value.to_string());
    }

    pub fn request_headers(&self) -> HashMap<String, String> {
        self.state.borrow().request_headers.clone()
    }

    pub fn get_response_header(&self, name: &str) -> Option<String> {
        self.state
            .borrow()
            .response_headers
            .get(name)
            .map(str::to_string)
    }

    /// All response headers as `name: value` lines separated by CRLF.
    pub fn get_all_response_headers(&self) -> String {
        self.state
            .borrow()
            .response_headers
            .iter()
            .map(|(name, value)| format!("{}: {}\r\n", name, value))
            .collect()
    }

    /// Recorded only; bodies are always decoded by the response content-type.
    pub fn override_mime_type(&self, mime: &str) {
        self.state.borrow_mut().mime_override = Some(mime.to_string());
    }

    pub fn mime_override(&self) -> Option<String> {
        self.state.borrow().mime_override.clone()
    }

    pub fn add_event_listener<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&Event) + 'static,
    {
        self.events.add_event_listener(event_type, listener)
    }

    pub fn remove_event_listener(&self, event_type: &str, id: ListenerId) -> bool {
        self.events.remove_event_listener(event_type, id)
    }

    /// Set the `on<event_type>` callback.
    pub fn set_handler<F>(&self, event_type: &str, handler: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.events.set_handler(event_type, handler);
    }

    pub fn clear_handler(&self, event_type: &str) {
        self.events.clear_handler(event_type);
    }

    /// Target behind [`add_event_listener`](Self::add_event_listener) and
    /// [`set_handler`](Self::set_handler).
    pub fn events(&self) -> &EventTarget {
        &self.events
    }

    /// Upload sub-object. Receives `loadstart`, `loadend`, `abort` and
    /// `progress*` events fired on this request.
    pub fn upload(&self) -> &EventTarget {
        &self.upload
    }

    pub fn dispatch_event(&self, event: Event) {
        self.events.dispatch_event(&event);
        if relays_to_upload(&event.event_type) {
            self.upload.dispatch_event(&event);
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    pub fn status(&self) -> u16 {
        self.state.borrow().status
    }

    pub fn status_text(&self) -> String {
        self.state.borrow().status_text.clone()
    }

    pub fn response(&self) -> Option<ResponseBody> {
        self.state.borrow().response.clone()
    }

    pub fn response_text(&self) -> String {
        self.state.borrow().response_text.clone()
    }

    pub fn response_url(&self) -> String {
        self.state.borrow().response_url.clone()
    }

    pub fn method(&self) -> String {
        self.state.borrow().method.clone()
    }

    pub fn url(&self) -> String {
        self.state.borrow().url.clone()
    }

    pub fn is_async(&self) -> bool {
        self.state.borrow().is_async
    }

    pub fn user(&self) -> Option<String> {
        self.state.borrow().user.clone()
    }
}

impl fmt::Debug for LegacyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LegacyRequest")
            .field("ready_state", &state.ready_state)
            .field("method", &state.method)
            .field("url", &state.url)
            .field("status", &state.status)
            .finish_non_exhaustive()
    }
}
