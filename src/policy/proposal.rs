//! # Proposal Model
//!
//! A proposal is a batch of decoded messages a policy account executes as one
//! unit once its decision process has concluded. Only the fields the executor
//! needs live here; voting and tallying happen upstream.

use chrono::{DateTime, Duration, Utc};

use crate::messaging::{AccountAddress, Message};

/// Decision policy parameters relevant to execution timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionPolicy {
    /// Delay after submission before the proposal may execute, even if the
    /// decision already passed.
    pub min_execution_period: Duration,
}

impl DecisionPolicy {
    pub fn new(min_execution_period: Duration) -> Self {
        Self {
            min_execution_period,
        }
    }
}

/// A batch of messages executed on behalf of one authorizing policy account.
pub struct Proposal {
    pub id: u64,
    /// The policy account every message in the batch must be signed by.
    pub policy_address: AccountAddress,
    /// Ordered messages; executed in order, reported by position on failure.
    pub messages: Vec<Box<dyn Message>>,
    pub submit_time: DateTime<Utc>,
    pub voting_period_end: DateTime<Utc>,
}

impl Proposal {
    pub fn new(
        id: u64,
        policy_address: AccountAddress,
        messages: Vec<Box<dyn Message>>,
        submit_time: DateTime<Utc>,
        voting_period_end: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            policy_address,
            messages,
            submit_time,
            voting_period_end,
        }
    }
}

impl std::fmt::Debug for Proposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proposal")
            .field("id", &self.id)
            .field("policy_address", &self.policy_address)
            .field("messages", &self.messages.len())
            .field("submit_time", &self.submit_time)
            .field("voting_period_end", &self.voting_period_end)
            .finish()
    }
}
