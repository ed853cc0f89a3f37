#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatch Core
//!
//! Message routing and dispatch core for a transaction-processing
//! application: typed, schema-described request messages are resolved to
//! exactly one registered handler by fully-qualified type URL, admission
//! control runs before execution, and every dispatch returns emitted events
//! plus typed responses, or a precise error.
//!
//! ## Overview
//!
//! This crate sits at the trust boundary between untrusted submitted
//! transactions and privileged state-mutating handlers. Its guarantees:
//!
//! - **Exactly-once correct dispatch**: at most one handler per message type,
//!   enforced at registration; duplicate or unresolvable registrations abort
//!   application assembly.
//! - **No admission bypass**: when an admission controller is configured,
//!   every execution path through the router consults it before the handler
//!   runs.
//! - **Event isolation**: each dispatch owns a fresh event envelope; events
//!   never leak between concurrent dispatches.
//! - **All-or-nothing batch authorization**: policy-executed batches verify
//!   every message's signers against the authorizing account before any
//!   message is dispatched.
//!
//! ## Module Organization
//!
//! - [`execution`] - the message router, execution context, events, and
//!   service descriptors
//! - [`messaging`] - the decoded-message model and signer resolution
//! - [`registry`] - the message type registry
//! - [`resilience`] - admission control: circuit breaker and deny-list filter
//! - [`policy`] - proposal batch execution with authorization guard
//! - [`config`] - configuration management
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dispatch_core::execution::{MessageRouter, ServiceDescriptor};
//! use dispatch_core::registry::{MessageDescriptor, TypeRegistry};
//! use std::sync::Arc;
//!
//! # fn example(service: ServiceDescriptor) -> Result<(), Box<dyn std::error::Error>> {
//! // 1. Register message schemas.
//! let mut registry = TypeRegistry::new();
//! registry.register(MessageDescriptor::opaque("/bank.v1.MsgSend"));
//!
//! // 2. Register services; any configuration defect aborts startup here.
//! let mut router = MessageRouter::new(Arc::new(registry));
//! router.register_service(service)?;
//!
//! // 3. Freeze and serve: the router is read-only from now on.
//! let router = Arc::new(router);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod messaging;
pub mod policy;
pub mod registry;
pub mod resilience;

pub use config::{AdmissionConfig, DispatchConfig, PolicyConfig};
pub use error::{DispatchError, Result};
pub use execution::{
    DispatchResult, Event, EventAttribute, EventCollector, ExecutionContext, HeaderInfo,
    KeyValueStore, MemoryStore, MessageRouter, MethodDescriptor, MsgHandler, MsgServiceHandler,
    RawMsgHandler, ServiceDescriptor,
};
pub use messaging::{AccountAddress, DeclaredSigners, Message, SignerResolver};
pub use registry::{MessageDescriptor, TypeRegistry};
pub use resilience::{
    AdmissionController, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerController,
    CircuitState, MsgTypeFilter,
};
pub use policy::{ensure_msg_authz, DecisionPolicy, Proposal, ProposalExecutor};
