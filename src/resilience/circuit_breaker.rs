//! # Circuit Breaker Implementation
//!
//! Fault isolation for the dispatch path. The classic three-state breaker:
//! Closed (normal operation), Open (failing fast), and Half-Open (testing
//! recovery). [`CircuitBreakerController`] keys one breaker per message type
//! and plugs the state machine into the router's admission contract.
//!
//! Unlike a breaker that wraps the protected call, admission here is split in
//! two: the router asks [`CircuitBreaker::allow_call`] *before* executing and
//! the caller reports [`CircuitBreakerController::record_outcome`] after, so
//! a denied dispatch provably never runs the handler.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::execution::context::ExecutionContext;
use crate::resilience::admission::AdmissionController;
use crate::resilience::config::CircuitBreakerConfig;

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - limited calls allowed to test system health
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // safest state
        }
    }
}

/// Snapshot of one breaker's counters and state.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerMetrics {
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub rejected_calls: u64,
    pub consecutive_failures: u64,
    pub half_open_successes: u64,
    pub current_state: Option<CircuitState>,
}

/// Core circuit breaker with atomic state management.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Current circuit state (atomic for thread safety)
    state: AtomicU8,

    config: CircuitBreakerConfig,

    metrics: Mutex<CircuitBreakerMetrics>,

    /// Time when circuit was opened (for timeout calculations)
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout.as_secs(),
            success_threshold = config.success_threshold,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            metrics: Mutex::new(CircuitBreakerMetrics::default()),
            opened_at: Mutex::new(None),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether a call should be admitted right now.
    ///
    /// An open circuit whose timeout has elapsed transitions to half-open and
    /// admits the probe call.
    pub fn allow_call(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened_at = *self.opened_at.lock();
                match opened_at {
                    Some(opened_time) if opened_time.elapsed() >= self.config.timeout => {
                        self.transition_to_half_open();
                        true
                    }
                    Some(_) => {
                        self.metrics.lock().rejected_calls += 1;
                        false
                    }
                    None => {
                        // Open with no timestamp shouldn't happen; admit rather
                        // than wedge the route.
                        warn!(component = %self.name, "Circuit open but no timestamp recorded");
                        true
                    }
                }
            }
            CircuitState::HalfOpen => {
                let mut metrics = self.metrics.lock();
                if metrics.half_open_successes < self.config.success_threshold as u64 {
                    true
                } else {
                    metrics.rejected_calls += 1;
                    false
                }
            }
        }
    }

    /// Record a successful operation
    pub fn record_success(&self) {
        let mut metrics = self.metrics.lock();
        metrics.total_calls += 1;
        metrics.success_count += 1;

        match self.state() {
            CircuitState::HalfOpen => {
                metrics.half_open_successes += 1;
                if metrics.half_open_successes >= self.config.success_threshold as u64 {
                    drop(metrics);
                    self.transition_to_closed();
                }
            }
            CircuitState::Closed => {
                metrics.consecutive_failures = 0;
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed operation
    pub fn record_failure(&self) {
        let mut metrics = self.metrics.lock();
        metrics.total_calls += 1;
        metrics.failure_count += 1;

        match self.state() {
            CircuitState::Closed => {
                metrics.consecutive_failures += 1;
                if metrics.consecutive_failures >= self.config.failure_threshold as u64 {
                    drop(metrics);
                    self.transition_to_open();
                }
            }
            CircuitState::HalfOpen => {
                // Any failure in half-open state immediately reopens.
                drop(metrics);
                self.transition_to_open();
            }
            CircuitState::Open => {}
        }
    }

    fn transition_to_closed(&self) {
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);

        let mut metrics = self.metrics.lock();
        metrics.consecutive_failures = 0;
        metrics.half_open_successes = 0;
        *self.opened_at.lock() = None;

        info!(
            component = %self.name,
            total_calls = metrics.total_calls,
            "🟢 Circuit breaker closed (recovered)"
        );
    }

    fn transition_to_open(&self) {
        self.state.store(CircuitState::Open as u8, Ordering::Release);
        *self.opened_at.lock() = Some(Instant::now());

        let mut metrics = self.metrics.lock();
        metrics.half_open_successes = 0;

        error!(
            component = %self.name,
            consecutive_failures = metrics.consecutive_failures,
            failure_threshold = self.config.failure_threshold,
            timeout_seconds = self.config.timeout.as_secs(),
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_half_open(&self) {
        self.state
            .store(CircuitState::HalfOpen as u8, Ordering::Release);
        self.metrics.lock().half_open_successes = 0;

        info!(
            component = %self.name,
            success_threshold = self.config.success_threshold,
            "🟡 Circuit breaker half-open (testing recovery)"
        );
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
        self.transition_to_open();
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
        self.transition_to_closed();
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let mut snapshot = self.metrics.lock().clone();
        snapshot.current_state = Some(self.state());
        snapshot
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Admission controller keying one circuit breaker per message type.
///
/// `is_allowed` reads the breaker for the message's type URL; callers feed
/// dispatch outcomes back through [`record_outcome`] so repeated handler
/// failures trip that one message type without affecting the rest of the
/// route table.
///
/// [`record_outcome`]: CircuitBreakerController::record_outcome
#[derive(Debug)]
pub struct CircuitBreakerController {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerController {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    fn breaker(&self, msg_type_url: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(msg_type_url.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    msg_type_url.to_string(),
                    self.config.clone(),
                ))
            })
            .clone()
    }

    /// Report the outcome of a dispatch admitted for this message type.
    pub fn record_outcome(&self, msg_type_url: &str, success: bool) {
        let breaker = self.breaker(msg_type_url);
        if success {
            breaker.record_success();
        } else {
            breaker.record_failure();
        }
    }

    /// Operator override: trip the breaker for one message type.
    pub fn force_open(&self, msg_type_url: &str) {
        self.breaker(msg_type_url).force_open();
    }

    /// Operator override: reset the breaker for one message type.
    pub fn force_closed(&self, msg_type_url: &str) {
        self.breaker(msg_type_url).force_closed();
    }

    /// Metrics snapshot for one message type, if it has been seen.
    pub fn metrics(&self, msg_type_url: &str) -> Option<CircuitBreakerMetrics> {
        self.breakers.get(msg_type_url).map(|b| b.metrics())
    }
}

#[async_trait]
impl AdmissionController for CircuitBreakerController {
    async fn is_allowed(&self, _ctx: &ExecutionContext, msg_type_url: &str) -> Result<bool> {
        let allowed = self.breaker(msg_type_url).allow_call();
        if !allowed {
            debug!(type_url = %msg_type_url, "Dispatch rejected by open circuit");
        }
        Ok(allowed)
    }
}
