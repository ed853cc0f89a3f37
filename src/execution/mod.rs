//! # Execution Layer
//!
//! The message router and everything a dispatch runs inside: the execution
//! context with its per-dispatch event envelope, service descriptors, and the
//! handler trait.
//!
//! ## Architecture
//!
//! - [`router`] - route table, registration validation, dispatch pipeline
//! - [`context`] - execution context, header/time and store capabilities
//! - [`events`] - typed events and the per-dispatch collector
//! - [`service`] - service/method descriptors and the `MsgHandler` trait

pub mod context;
pub mod events;
pub mod router;
pub mod service;

pub use context::{ExecutionContext, HeaderInfo, KeyValueStore, MemoryStore};
pub use events::{Event, EventAttribute, EventCollector};
pub use router::{DispatchResult, MessageRouter, MsgServiceHandler, RawMsgHandler};
pub use service::{MethodDescriptor, MsgHandler, ServiceDescriptor};
