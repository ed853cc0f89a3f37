//! # Resilience Module
//!
//! Admission control for the dispatch path: the [`AdmissionController`]
//! contract the router consults before every handler invocation, plus the two
//! shipped implementations, a per-message-type circuit breaker and a static
//! deny-list filter.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::resilience::{CircuitBreakerConfig, CircuitBreakerController};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 5,
//!     timeout: Duration::from_secs(30),
//!     success_threshold: 2,
//! };
//!
//! let controller = CircuitBreakerController::new(config);
//! // router.set_admission_controller(Arc::new(controller))
//! ```

pub mod admission;
pub mod circuit_breaker;
pub mod config;

pub use admission::{AdmissionController, MsgTypeFilter};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerController, CircuitBreakerMetrics, CircuitState,
};
pub use config::CircuitBreakerConfig;
