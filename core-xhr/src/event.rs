//! Event target with a listener registry and `on<event>` handler slots.
//!
//! Listeners are kept per event type in registration order. Dispatch takes a
//! snapshot first, so a listener may add or remove listeners (or call back
//! into the request that owns the target) while it runs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub const READY_STATE_CHANGE: &str = "readystatechange";
pub const LOAD_START: &str = "loadstart";
pub const PROGRESS: &str = "progress";
pub const LOAD: &str = "load";
pub const ERROR: &str = "error";
pub const ABORT: &str = "abort";
pub const LOAD_END: &str = "loadend";

/// Event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_type: String,
    pub loaded: u64,
    pub total: u64,
    pub length_computable: bool,
    /// Failure description for `error` events.
    pub message: Option<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            loaded: 0,
            total: 0,
            length_computable: false,
            message: None,
        }
    }

    pub fn progress(event_type: impl Into<String>, loaded: u64, total: Option<u64>) -> Self {
        Self {
            loaded,
            total: total.unwrap_or(0),
            length_computable: total.is_some(),
            ..Self::new(event_type)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(ERROR)
        }
    }
}

pub type Listener = Rc<dyn Fn(&Event)>;

/// Handle returned by [`EventTarget::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    listeners: HashMap<String, Vec<(ListenerId, Listener)>>,
    handlers: HashMap<String, Listener>,
    next_id: u64,
}

/// Shared, single-threaded event target. Clones refer to the same registry.
#[derive(Clone, Default)]
pub struct EventTarget {
    registry: Rc<RefCell<Registry>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&Event) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry
            .listeners
            .entry(event_type.to_string())
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` when no listener with `id` was registered for the type.
    pub fn remove_event_listener(&self, event_type: &str, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(listeners) = registry.listeners.get_mut(event_type) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }

    /// Set the `on<event_type>` handler, replacing any previous one.
    pub fn set_handler<F>(&self, event_type: &str, handler: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.registry
            .borrow_mut()
            .handlers
            .insert(event_type.to_string(), Rc::new(handler));
    }

    pub fn clear_handler(&self, event_type: &str) {
        self.registry.borrow_mut().handlers.remove(event_type);
    }

    pub fn has_handler(&self, event_type: &str) -> bool {
        self.registry.borrow().handlers.contains_key(event_type)
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(event_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Run listeners in registration order, then the handler.
    pub fn dispatch_event(&self, event: &Event) {
        let (listeners, handler) = {
            let registry = self.registry.borrow();
            let listeners: Vec<Listener> = registry
                .listeners
                .get(&event.event_type)
                .map(|entries| entries.iter().map(|(_, l)| Rc::clone(l)).collect())
                .unwrap_or_default();
            let handler = registry.handlers.get(&event.event_type).cloned();
            (listeners, handler)
        };

        for listener in listeners {
            listener(event);
        }
        if let Some(handler) = handler {
            handler(event);
        }
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("EventTarget")
            .field("listeners", &registry.listeners.keys().collect::<Vec<_>>())
            .field("handlers", &registry.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Events mirrored onto the upload target.
pub fn relays_to_upload(event_type: &str) -> bool {
    matches!(event_type, LOAD_START | LOAD_END | ABORT) || event_type.starts_with(PROGRESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&Event)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_for = Rc::clone(&log);
        let make = move |tag: &str| {
            let log = Rc::clone(&log_for);
            let tag = tag.to_string();
            Box::new(move |event: &Event| {
                log.borrow_mut()
                    .push(format!("{}:{}", tag, event.event_type));
            }) as Box<dyn Fn(&Event)>
        };
        (log, make)
    }

    #[test]
    fn test_listeners_then_handler() {
        let target = EventTarget::new();
        let (log, make) = recorder();

        target.set_handler("load", make("handler"));
        target.add_event_listener("load", make("first"));
        target.add_event_listener("load", make("second"));
        target.add_event_listener("error", make("other"));

        target.dispatch_event(&Event::new("load"));

        assert_eq!(
            *log.borrow(),
            vec!["first:load", "second:load", "handler:load"]
        );
    }

    #[test]
    fn test_remove_listener() {
        let target = EventTarget::new();
        let (log, make) = recorder();

        let id = target.add_event_listener("progress", make("gone"));
        target.add_event_listener("progress", make("kept"));

        assert!(target.remove_event_listener("progress", id));
        assert!(!target.remove_event_listener("progress", id));
        assert!(!target.remove_event_listener("load", id));

        target.dispatch_event(&Event::new("progress"));
        assert_eq!(*log.borrow(), vec!["kept:progress"]);
        assert_eq!(target.listener_count("progress"), 1);
    }

    #[test]
    fn test_clear_handler() {
        let target = EventTarget::new();
        let (log, make) = recorder();

        target.set_handler("error", make("h"));
        assert!(target.has_handler("error"));
        target.clear_handler("error");
        target.dispatch_event(&Event::error("boom"));

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let target = EventTarget::new();
        let inner = target.clone();
        target.add_event_listener("load", move |_| {
            inner.add_event_listener("load", |_| {});
        });

        target.dispatch_event(&Event::new("load"));
        assert_eq!(target.listener_count("load"), 2);
    }

    #[test]
    fn test_upload_relay_names() {
        assert!(relays_to_upload("loadstart"));
        assert!(relays_to_upload("loadend"));
        assert!(relays_to_upload("abort"));
        assert!(relays_to_upload("progress"));
        assert!(relays_to_upload("progress-custom"));
        assert!(!relays_to_upload("load"));
        assert!(!relays_to_upload("error"));
        assert!(!relays_to_upload("readystatechange"));
    }

    #[test]
    fn test_progress_event_fields() {
        let event = Event::progress("progress", 10, Some(10));
        assert!(event.length_computable);
        assert_eq!(event.total, 10);

        let event = Event::progress("progress", 3, None);
        assert!(!event.length_computable);
    }
}
