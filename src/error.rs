//! # Structured Error Handling
//!
//! Error taxonomy for the dispatch core. Two families matter to callers:
//!
//! - **Configuration errors** surface during application assembly (service
//!   registration). They are fatal: the process should abort rather than serve
//!   with ambiguous or missing routes. Use [`DispatchError::is_configuration`]
//!   to classify.
//! - **Dispatch errors** surface per message at runtime. They are recoverable:
//!   each is reported to the caller of that dispatch and must never take down
//!   the dispatching task or leak into unrelated in-flight dispatches.

use chrono::{DateTime, Utc};

/// Errors produced by registration, admission, and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A service method was registered before its request schema.
    #[error(
        "message type {type_url} has not been registered in the type registry; \
         register all message schemas before calling register_service"
    )]
    UnregisteredType { type_url: String },

    /// Two services claimed the same request type. The first route wins and
    /// registration of the second aborts.
    #[error(
        "message type {type_url} is already routed; conflicting registration from service {service}"
    )]
    DuplicateRoute { type_url: String, service: String },

    /// The service descriptor itself is unusable (empty name, empty type URLs).
    #[error("malformed service descriptor for {service}: {reason}")]
    MalformedService { service: String, reason: String },

    /// Invalid configuration values detected at load or validation time.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// No route exists for the message type. Only produced by the erroring
    /// `invoke` path; plain lookups return `None` instead.
    #[error("no message handler for {type_url}")]
    RouteNotFound { type_url: String },

    /// The admission controller denied execution.
    #[error("admission controller disallows execution of message {type_url}")]
    Disallowed { type_url: String },

    /// The admission controller itself failed.
    #[error("admission check failed for {type_url}: {reason}")]
    AdmissionFailed { type_url: String, reason: String },

    /// The message failed its own self-validation before reaching admission
    /// control or the handler.
    #[error("invalid message {type_url}: {reason}")]
    InvalidMessage { type_url: String, reason: String },

    /// The invoked business logic failed.
    #[error("handler for {type_url} failed: {reason}")]
    Handler { type_url: String, reason: String },

    /// The handler returned a response of the wrong type.
    #[error("handler for {type_url} returned {actual}, expected {expected}")]
    TypeMismatch {
        type_url: String,
        expected: String,
        actual: String,
    },

    /// A message in a batch is not signed by the authorizing principal.
    #[error("message does not have policy authorization; expected {expected}, got {actual}")]
    Unauthorized { expected: String, actual: String },

    /// Signer resolution failed for a message in a batch.
    #[error("unable to resolve signers for {type_url}: {reason}")]
    SignerResolution { type_url: String, reason: String },

    /// Batch executed before its minimum execution date.
    #[error("must wait until {not_before} to execute proposal {proposal_id}")]
    ExecutionTooEarly {
        proposal_id: u64,
        not_before: DateTime<Utc>,
    },

    /// Batch executed after its expiry date.
    #[error("proposal {proposal_id} expired on {expired_at}")]
    ProposalExpired {
        proposal_id: u64,
        expired_at: DateTime<Utc>,
    },

    /// A message inside a batch failed, annotated with its position.
    #[error("message {type_url} at position {position}: {source}")]
    MessageFailed {
        type_url: String,
        position: usize,
        #[source]
        source: Box<DispatchError>,
    },
}

impl DispatchError {
    /// Whether this error is a startup configuration defect.
    ///
    /// Configuration errors must abort application initialization; proceeding
    /// would leave a message type with ambiguous or missing routing.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DispatchError::UnregisteredType { .. }
                | DispatchError::DuplicateRoute { .. }
                | DispatchError::MalformedService { .. }
                | DispatchError::Configuration { .. }
        )
    }

    /// Wrap an error that occurred while executing one message of a batch.
    pub fn at_position(self, type_url: impl Into<String>, position: usize) -> Self {
        DispatchError::MessageFailed {
            type_url: type_url.into(),
            position,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        let fatal = DispatchError::DuplicateRoute {
            type_url: "/bank.v1.MsgSend".to_string(),
            service: "bank.v1.Msg".to_string(),
        };
        assert!(fatal.is_configuration());

        let recoverable = DispatchError::Disallowed {
            type_url: "/bank.v1.MsgSend".to_string(),
        };
        assert!(!recoverable.is_configuration());
    }

    #[test]
    fn test_positional_annotation_display() {
        let err = DispatchError::Handler {
            type_url: "/bank.v1.MsgSend".to_string(),
            reason: "insufficient funds".to_string(),
        }
        .at_position("/bank.v1.MsgSend", 2);

        let rendered = err.to_string();
        assert!(rendered.contains("position 2"));
        assert!(rendered.contains("insufficient funds"));
    }
}
