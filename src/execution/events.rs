//! # Dispatch Events
//!
//! Typed events emitted by handlers during execution. Every routed dispatch
//! owns a fresh [`EventCollector`]; isolation between concurrent dispatches
//! is structural, not conventional: no other dispatch holds a reference to
//! the collector.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single key/value attribute of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// An event emitted by a handler, e.g. `transfer { from, to, amount }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Attach a structured attribute, rendered as JSON.
    pub fn with_json_attribute<T: serde::Serialize>(
        self,
        key: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<Self> {
        let rendered = serde_json::to_string(value)?;
        Ok(self.with_attribute(key, rendered))
    }
}

/// Append-only event sink scoped to one dispatch.
///
/// Cloning shares the underlying buffer; the router hands each dispatch a
/// newly constructed collector so clones never cross dispatch boundaries.
#[derive(Debug, Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to this dispatch's sequence.
    pub fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }

    /// Drain the collected events, in emission order.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Copy of the events collected so far, without draining.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
