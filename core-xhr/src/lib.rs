//! # Legacy Request Emulator
//!
//! An event-driven request object (ready states, listeners, `on<event>`
//! handlers, upload sub-object) implemented on top of the page's
//! asynchronous [`Fetch`](bridge_traits::Fetch) primitive. Pages and
//! libraries written against the older request API keep working, and every
//! call they make goes through whatever fetch is installed, including the
//! bridge interceptor.
//!
//! ## Usage
//!
//! ```ignore
//! use core_xhr::LegacyRequest;
//!
//! let request = LegacyRequest::new(page_fetch.clone());
//! request.add_event_listener("load", move |_| println!("loaded"));
//! request.open("GET", "/todos");
//! request.send(None).await;
//!
//! assert_eq!(request.status(), 200);
//! ```

pub mod body;
pub mod error;
pub mod event;
pub mod ready_state;
pub mod request;

pub use body::{Blob, ResponseBody};
pub use error::{Result, XhrError};
pub use event::{Event, EventTarget, ListenerId};
pub use ready_state::ReadyState;
pub use request::LegacyRequest;
