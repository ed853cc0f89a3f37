//! # Message Router
//!
//! Central registry mapping message type URLs to handlers: one-time service
//! registration during application assembly, then repeated low-latency
//! dispatch from concurrent workers.
//!
//! ## Registration discipline
//!
//! Registration takes `&mut self` and happens strictly before the router is
//! shared (`Arc<MessageRouter>`) with dispatching tasks, so the route table
//! is immutable during serving and lookups need no locking. All registration
//! failures are configuration defects returned as errors; the application
//! assembler is expected to abort startup on any of them.
//!
//! ## Dispatch pipeline
//!
//! Every installed route closure runs the same pipeline: open a fresh event
//! envelope, run the message's self-validation, consult the admission
//! controller, invoke the handler, type-check the response, and assemble the
//! [`DispatchResult`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatch_core::execution::{MessageRouter, ServiceDescriptor};
//! use dispatch_core::registry::TypeRegistry;
//! use std::sync::Arc;
//!
//! # fn example(service: ServiceDescriptor) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(TypeRegistry::new());
//! let mut router = MessageRouter::new(registry);
//! router.register_service(service)?;
//!
//! // Registration complete: freeze and share with dispatching tasks.
//! let router = Arc::new(router);
//! # Ok(())
//! # }
//! ```

use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DispatchError, Result};
use crate::execution::context::ExecutionContext;
use crate::execution::events::Event;
use crate::execution::service::{MethodDescriptor, ServiceDescriptor};
use crate::messaging::Message;
use crate::registry::TypeRegistry;
use crate::resilience::AdmissionController;

/// Outcome of one successful dispatch: the events the handler emitted plus
/// its typed response payload(s).
#[derive(Debug)]
pub struct DispatchResult {
    pub events: Vec<Event>,
    pub msg_responses: Vec<Box<dyn Message>>,
}

/// Full dispatch pipeline for one message type, invoked with the caller's
/// execution context and the decoded message.
pub type MsgServiceHandler = Arc<
    dyn for<'a> Fn(&'a ExecutionContext, &'a dyn Message) -> BoxFuture<'a, Result<DispatchResult>>
        + Send
        + Sync,
>;

/// Admission-wrapped raw handler for the bulk path: no envelope isolation or
/// response assembly, for callers that already hold typed payloads.
pub type RawMsgHandler = Arc<
    dyn for<'a> Fn(&'a ExecutionContext, &'a dyn Message) -> BoxFuture<'a, Result<Box<dyn Message>>>
        + Send
        + Sync,
>;

fn route_fn<F>(f: F) -> MsgServiceHandler
where
    F: for<'a> Fn(&'a ExecutionContext, &'a dyn Message) -> BoxFuture<'a, Result<DispatchResult>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

fn raw_fn<F>(f: F) -> RawMsgHandler
where
    F: for<'a> Fn(&'a ExecutionContext, &'a dyn Message) -> BoxFuture<'a, Result<Box<dyn Message>>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Routes fully-qualified message types to their handlers.
pub struct MessageRouter {
    type_registry: Arc<TypeRegistry>,
    routes: HashMap<String, MsgServiceHandler>,
    handlers: HashMap<String, RawMsgHandler>,
    response_by_msg_name: HashMap<String, String>,
    admission: Option<Arc<dyn AdmissionController>>,
}

impl MessageRouter {
    /// Create a router over the given type registry. Schemas must already be
    /// registered there before services are registered here.
    pub fn new(type_registry: Arc<TypeRegistry>) -> Self {
        Self {
            type_registry,
            routes: HashMap::new(),
            handlers: HashMap::new(),
            response_by_msg_name: HashMap::new(),
            admission: None,
        }
    }

    /// Install the admission controller consulted before every dispatch.
    ///
    /// Must be called before any service registration: registered handlers
    /// capture the controller, so a later swap would leave some routes
    /// unguarded. Absent controller means unconditional allow.
    pub fn set_admission_controller(
        &mut self,
        controller: Arc<dyn AdmissionController>,
    ) -> Result<()> {
        if !self.routes.is_empty() {
            return Err(DispatchError::Configuration {
                reason: "admission controller must be installed before service registration"
                    .to_string(),
            });
        }
        self.admission = Some(controller);
        Ok(())
    }

    /// Register a service: one route per method descriptor.
    ///
    /// Fails fast on a malformed descriptor, a request type missing from the
    /// type registry, or a duplicate route, and installs nothing if any
    /// method is rejected, so a failed registration leaves no partial routes.
    pub fn register_service(&mut self, service: ServiceDescriptor) -> Result<()> {
        if service.service_name.is_empty() {
            return Err(DispatchError::MalformedService {
                service: "<unnamed>".to_string(),
                reason: "service name cannot be empty".to_string(),
            });
        }

        // Validate every method before installing any route.
        let mut incoming = HashSet::new();
        for method in &service.methods {
            self.validate_method(&service.service_name, method)?;
            if !incoming.insert(method.request_type_url.clone()) {
                return Err(DispatchError::DuplicateRoute {
                    type_url: method.request_type_url.clone(),
                    service: service.service_name.clone(),
                });
            }
        }

        for method in service.methods {
            self.install_route(&service.service_name, method);
        }
        Ok(())
    }

    fn validate_method(&self, service_name: &str, method: &MethodDescriptor) -> Result<()> {
        if method.method_name.is_empty()
            || method.request_type_url.is_empty()
            || method.response_type_url.is_empty()
        {
            return Err(DispatchError::MalformedService {
                service: service_name.to_string(),
                reason: format!(
                    "method descriptor {:?} must declare method name, request and response type URLs",
                    method.method_name
                ),
            });
        }

        // Schema registration must precede service registration.
        self.type_registry.resolve(&method.request_type_url)?;

        if self.routes.contains_key(&method.request_type_url) {
            return Err(DispatchError::DuplicateRoute {
                type_url: method.request_type_url.clone(),
                service: service_name.to_string(),
            });
        }
        Ok(())
    }

    fn install_route(&mut self, service_name: &str, method: MethodDescriptor) {
        let request_url = method.request_type_url.clone();
        let response_url = method.response_type_url.clone();

        self.response_by_msg_name
            .insert(request_url.clone(), response_url.clone());

        // Bulk path: admission decoration only, no envelope or response
        // assembly.
        let raw = {
            let handler = Arc::clone(&method.handler);
            let admission = self.admission.clone();
            let request_url = request_url.clone();
            raw_fn(move |ctx, msg| {
                let handler = Arc::clone(&handler);
                let admission = admission.clone();
                let request_url = request_url.clone();
                Box::pin(async move {
                    if let Some(controller) = &admission {
                        if !controller.is_allowed(ctx, &request_url).await? {
                            return Err(DispatchError::Disallowed {
                                type_url: request_url,
                            });
                        }
                    }
                    handler.handle(ctx, msg).await
                })
            })
        };
        self.handlers.insert(request_url.clone(), raw);

        // Routed path: the full dispatch pipeline.
        let route = {
            let handler = Arc::clone(&method.handler);
            let admission = self.admission.clone();
            let request_url = request_url.clone();
            let response_url = response_url.clone();
            route_fn(move |ctx, msg| {
                let handler = Arc::clone(&handler);
                let admission = admission.clone();
                let request_url = request_url.clone();
                let response_url = response_url.clone();
                Box::pin(async move {
                    // Fresh envelope: events reflect only this dispatch.
                    let scoped = ctx.with_fresh_events();

                    msg.validate_basic()?;

                    if let Some(controller) = &admission {
                        if !controller.is_allowed(&scoped, &request_url).await? {
                            return Err(DispatchError::Disallowed {
                                type_url: request_url,
                            });
                        }
                    }

                    let response = handler.handle(&scoped, msg).await?;
                    if response.type_url() != response_url {
                        return Err(DispatchError::TypeMismatch {
                            type_url: request_url,
                            expected: response_url,
                            actual: response.type_url().to_string(),
                        });
                    }

                    debug!(
                        type_url = %request_url,
                        events = scoped.events().len(),
                        "Dispatch completed"
                    );

                    Ok(DispatchResult {
                        events: scoped.events().take(),
                        msg_responses: vec![response],
                    })
                })
            })
        };
        self.routes.insert(request_url.clone(), route);

        info!(
            service = %service_name,
            method = %method.method_name,
            request = %request_url,
            response = %response_url,
            admission_wrapped = self.admission.is_some(),
            "Registered message route"
        );
    }

    /// Dispatch pipeline for a message, or `None` if its type is unrouted.
    /// Absence is not an error here; callers decide whether it is fatal.
    pub fn handler(&self, msg: &dyn Message) -> Option<MsgServiceHandler> {
        self.handler_by_type_url(msg.type_url())
    }

    /// Dispatch pipeline by type URL, or `None` if unrouted.
    pub fn handler_by_type_url(&self, type_url: &str) -> Option<MsgServiceHandler> {
        self.routes.get(type_url).cloned()
    }

    /// Admission-wrapped raw handler for bulk/typed invocation, or `None`.
    pub fn handler_by_msg_name(&self, msg_name: &str) -> Option<RawMsgHandler> {
        self.handlers.get(msg_name).cloned()
    }

    /// Response type URL registered for a request type URL.
    pub fn response_name_by_msg_name(&self, msg_name: &str) -> Option<String> {
        self.response_by_msg_name.get(msg_name).cloned()
    }

    /// Resolve and dispatch in one call, erroring on an absent route.
    pub async fn invoke(&self, ctx: &ExecutionContext, msg: &dyn Message) -> Result<DispatchResult> {
        let handler =
            self.handler(msg)
                .ok_or_else(|| DispatchError::RouteNotFound {
                    type_url: msg.type_url().to_string(),
                })?;
        (*handler)(ctx, msg).await
    }

    pub fn has_route(&self, type_url: &str) -> bool {
        self.routes.contains_key(type_url)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Registered request type URLs, sorted for stable diagnostics.
    pub fn registered_type_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.routes.keys().cloned().collect();
        urls.sort();
        urls
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("routes", &self.route_count())
            .field("admission_configured", &self.admission.is_some())
            .finish()
    }
}
