//! # Proposal Executor
//!
//! Routes a passed proposal's messages through the router on behalf of its
//! policy account. Messages are limited to those signed by the policy account
//! only; anything else would hand the policy access to other accounts, since
//! per-message authentication middleware is bypassed on this path.
//!
//! Admission is all-or-nothing: temporal bounds and the authorization guard
//! run before any message in the batch is dispatched. Execution of an
//! admitted batch may still fail per message; the failing message is reported
//! with its type URL and position.

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DispatchError, Result};
use crate::execution::context::ExecutionContext;
use crate::execution::router::{DispatchResult, MessageRouter};
use crate::messaging::{AccountAddress, Message, SignerResolver};
use crate::policy::proposal::{DecisionPolicy, Proposal};

/// Executes proposal batches through the message router.
pub struct ProposalExecutor {
    router: Arc<MessageRouter>,
    signer_resolver: Arc<dyn SignerResolver>,
    /// Window after the voting period end in which execution is still valid.
    max_execution_period: Duration,
}

impl ProposalExecutor {
    pub fn new(
        router: Arc<MessageRouter>,
        signer_resolver: Arc<dyn SignerResolver>,
        max_execution_period: Duration,
    ) -> Self {
        Self {
            router,
            signer_resolver,
            max_execution_period,
        }
    }

    /// Execute all of a proposal's messages as one unit.
    ///
    /// Order of checks, none of which dispatch anything:
    /// 1. not before `submit_time + min_execution_period` (inclusive bound);
    /// 2. not after `voting_period_end + max_execution_period`;
    /// 3. every resolved signer of every message byte-equals the policy
    ///    address.
    ///
    /// Only then are messages dispatched, in order, stopping at the first
    /// failure with its position annotated.
    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
        proposal: &Proposal,
        policy: &DecisionPolicy,
    ) -> Result<Vec<DispatchResult>> {
        let current_time = ctx.header().time;

        let min_execution_date = proposal.submit_time + policy.min_execution_period;
        if current_time < min_execution_date {
            return Err(DispatchError::ExecutionTooEarly {
                proposal_id: proposal.id,
                not_before: min_execution_date,
            });
        }

        let expiry_date = proposal.voting_period_end + self.max_execution_period;
        if expiry_date < current_time {
            return Err(DispatchError::ProposalExpired {
                proposal_id: proposal.id,
                expired_at: expiry_date,
            });
        }

        ensure_msg_authz(
            &proposal.messages,
            &proposal.policy_address,
            self.signer_resolver.as_ref(),
        )?;

        let mut results = Vec::with_capacity(proposal.messages.len());
        for (position, msg) in proposal.messages.iter().enumerate() {
            debug!(
                proposal_id = proposal.id,
                position,
                type_url = %msg.type_url(),
                "Executing proposal message"
            );
            let result = self
                .router
                .invoke(ctx, msg.as_ref())
                .await
                .map_err(|err| err.at_position(msg.type_url(), position))?;
            results.push(result);
        }

        info!(
            proposal_id = proposal.id,
            messages = results.len(),
            "Proposal executed"
        );
        Ok(results)
    }
}

/// Require that every resolved signer of every message byte-equals the policy
/// account address.
///
/// Runs strictly before any dispatch of the batch; the first mismatch aborts
/// with expected vs. actual addresses.
pub fn ensure_msg_authz(
    msgs: &[Box<dyn Message>],
    policy_address: &AccountAddress,
    resolver: &dyn SignerResolver,
) -> Result<()> {
    for msg in msgs {
        // In practice this is a single-element list without duplicates, but
        // every declared signer is checked regardless.
        let signers = resolver.resolve_signers(msg.as_ref())?;
        for signer in signers {
            if signer != *policy_address {
                return Err(DispatchError::Unauthorized {
                    expected: policy_address.to_string(),
                    actual: signer.to_string(),
                });
            }
        }
    }
    Ok(())
}
