//! # Policy Execution
//!
//! Batch execution of messages on behalf of a single authorizing policy
//! account: the authorization guard (every signer must byte-equal the policy
//! address), the temporal execution window, and positional failure reporting.

pub mod executor;
pub mod proposal;

pub use executor::{ensure_msg_authz, ProposalExecutor};
pub use proposal::{DecisionPolicy, Proposal};
