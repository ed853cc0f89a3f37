//! # Service Descriptors and Handler Trait
//!
//! The registration input for the router: a named service bundles method
//! descriptors, each pairing a handler object with explicitly declared
//! request and response type URLs. Declaring the types up front keeps
//! registration free of any reflection over handler internals.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::execution::context::ExecutionContext;
use crate::messaging::Message;

/// Business logic for one message type.
///
/// Handlers receive the execution context and the decoded request, and return
/// the typed response whose type URL must match the one declared at
/// registration. Errors propagate to the dispatching caller as-is.
#[async_trait]
pub trait MsgHandler: Send + Sync {
    async fn handle(&self, ctx: &ExecutionContext, msg: &dyn Message) -> Result<Box<dyn Message>>;

    /// Handler name for logs and diagnostics.
    fn handler_name(&self) -> &str {
        "msg_handler"
    }
}

/// One method of a service: request/response identifiers plus the handler.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub method_name: String,
    pub request_type_url: String,
    pub response_type_url: String,
    pub handler: Arc<dyn MsgHandler>,
}

impl MethodDescriptor {
    pub fn new(
        method_name: impl Into<String>,
        request_type_url: impl Into<String>,
        response_type_url: impl Into<String>,
        handler: Arc<dyn MsgHandler>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            request_type_url: request_type_url.into(),
            response_type_url: response_type_url.into(),
            handler,
        }
    }
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("method_name", &self.method_name)
            .field("request_type_url", &self.request_type_url)
            .field("response_type_url", &self.response_type_url)
            .field("handler", &self.handler.handler_name())
            .finish()
    }
}

/// A named set of method descriptors, supplied once by each functional module
/// during application assembly.
#[derive(Debug, Clone, Default)]
pub struct ServiceDescriptor {
    pub service_name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }
}
