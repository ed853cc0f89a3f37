//! # Execution Context
//!
//! The execution-time context handed to handlers: block header information,
//! the state-store capability, and the per-dispatch event collector. The
//! context is an explicit parameter everywhere; there is no ambient storage
//! to look it up from.
//!
//! The store and header services are collaborator interfaces; this crate
//! ships an in-memory store so handlers and tests have something real to run
//! against, but production embeds its own transactional store.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::execution::events::EventCollector;

/// Header information for the block or batch this dispatch executes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub chain_id: String,
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl HeaderInfo {
    pub fn new(chain_id: impl Into<String>, height: u64, time: DateTime<Utc>) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            time,
        }
    }
}

/// Narrow key-value store capability consumed by handlers.
///
/// Rollback of speculative writes on handler failure belongs to the enclosing
/// transaction machinery, not this interface.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn set(&self, key: Vec<u8>, value: Vec<u8>);
    fn delete(&self, key: &[u8]);
}

/// In-memory store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.write().insert(key, value);
    }

    fn delete(&self, key: &[u8]) {
        self.entries.write().remove(key);
    }
}

/// Per-dispatch execution context.
///
/// Cheap to clone: header and store are shared, and
/// [`ExecutionContext::with_fresh_events`] is how the router builds the
/// isolated envelope for each dispatch.
#[derive(Clone)]
pub struct ExecutionContext {
    header: HeaderInfo,
    store: Arc<dyn KeyValueStore>,
    events: EventCollector,
}

impl ExecutionContext {
    pub fn new(header: HeaderInfo, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            header,
            store,
            events: EventCollector::new(),
        }
    }

    /// Header/time capability.
    pub fn header(&self) -> &HeaderInfo {
        &self.header
    }

    /// Open the state store for this execution.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// The event collector scoped to this dispatch.
    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    /// Same header and store, brand-new event collector.
    ///
    /// The router calls this for every routed dispatch so events reflect only
    /// the work of the single dispatched message.
    pub fn with_fresh_events(&self) -> Self {
        Self {
            header: self.header.clone(),
            store: Arc::clone(&self.store),
            events: EventCollector::new(),
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("header", &self.header)
            .field("pending_events", &self.events.len())
            .finish()
    }
}
