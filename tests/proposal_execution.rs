//! Proposal batch execution tests: configuration-driven executor assembly,
//! full-batch results, and the byte-exact authorization property.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::any::Any;
use std::sync::Arc;

use dispatch_core::{
    ensure_msg_authz, AccountAddress, DecisionPolicy, DeclaredSigners, DispatchConfig,
    DispatchError, Event, ExecutionContext, HeaderInfo, MemoryStore, Message, MessageDescriptor,
    MessageRouter, MethodDescriptor, MsgHandler, Proposal, ProposalExecutor, Result,
    ServiceDescriptor, TypeRegistry,
};

#[derive(Debug)]
struct MsgUpdateParams {
    authority: AccountAddress,
    value: u64,
}

impl Message for MsgUpdateParams {
    fn type_url(&self) -> &str {
        "/params.v1.MsgUpdateParams"
    }

    fn signers(&self) -> Vec<AccountAddress> {
        vec![self.authority.clone()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct MsgUpdateParamsResponse;

impl Message for MsgUpdateParamsResponse {
    fn type_url(&self) -> &str {
        "/params.v1.MsgUpdateParamsResponse"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct UpdateParamsHandler;

#[async_trait]
impl MsgHandler for UpdateParamsHandler {
    async fn handle(&self, ctx: &ExecutionContext, msg: &dyn Message) -> Result<Box<dyn Message>> {
        let request = msg.as_any().downcast_ref::<MsgUpdateParams>().unwrap();
        ctx.store()
            .set(b"params/value".to_vec(), request.value.to_be_bytes().to_vec());
        ctx.events()
            .emit(Event::new("params_updated").with_attribute("value", request.value.to_string()));
        Ok(Box::new(MsgUpdateParamsResponse))
    }
}

fn policy_addr() -> AccountAddress {
    AccountAddress::new(vec![0x42; 8])
}

fn build_executor(config: &DispatchConfig) -> ProposalExecutor {
    let mut registry = TypeRegistry::new();
    registry.register(MessageDescriptor::opaque("/params.v1.MsgUpdateParams"));

    let mut router = MessageRouter::new(Arc::new(registry));
    router
        .register_service(ServiceDescriptor::new("params.v1.Msg").with_method(
            MethodDescriptor::new(
                "UpdateParams",
                "/params.v1.MsgUpdateParams",
                "/params.v1.MsgUpdateParamsResponse",
                Arc::new(UpdateParamsHandler),
            ),
        ))
        .unwrap();

    ProposalExecutor::new(
        Arc::new(router),
        Arc::new(DeclaredSigners),
        config.policy.max_execution_period(),
    )
}

fn update(authority: AccountAddress, value: u64) -> Box<dyn Message> {
    Box::new(MsgUpdateParams { authority, value })
}

#[tokio::test]
async fn test_batch_executes_with_per_message_results() {
    let config = DispatchConfig::default();
    let executor = build_executor(&config);

    let submit_time = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let proposal = Proposal::new(
        7,
        policy_addr(),
        vec![
            update(policy_addr(), 10),
            update(policy_addr(), 20),
            update(policy_addr(), 30),
        ],
        submit_time,
        submit_time + Duration::days(3),
    );
    let policy = DecisionPolicy::new(Duration::hours(12));

    let ctx = ExecutionContext::new(
        HeaderInfo::new("test-chain", 500, submit_time + Duration::days(1)),
        Arc::new(MemoryStore::new()),
    );

    let results = executor.execute(&ctx, &proposal, &policy).await.unwrap();
    assert_eq!(results.len(), 3);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.events.len(), 1);
        assert_eq!(
            result.events[0].attributes[0].value,
            ((i as u64 + 1) * 10).to_string()
        );
    }

    // Last write wins in the store: the batch ran in order.
    assert_eq!(
        ctx.store().get(b"params/value"),
        Some(30u64.to_be_bytes().to_vec())
    );
}

#[tokio::test]
async fn test_executor_honors_configured_max_execution_period() {
    let mut config = DispatchConfig::default();
    config.policy.max_execution_period_secs = 60;
    config.validate().unwrap();
    let executor = build_executor(&config);

    let submit_time = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let voting_period_end = submit_time + Duration::hours(1);
    let proposal = Proposal::new(
        8,
        policy_addr(),
        vec![update(policy_addr(), 1)],
        submit_time,
        voting_period_end,
    );
    let policy = DecisionPolicy::new(Duration::zero());

    let ctx = ExecutionContext::new(
        HeaderInfo::new(
            "test-chain",
            501,
            voting_period_end + Duration::seconds(61),
        ),
        Arc::new(MemoryStore::new()),
    );

    let err = executor.execute(&ctx, &proposal, &policy).await.unwrap_err();
    assert!(matches!(err, DispatchError::ProposalExpired { .. }));
}

proptest! {
    /// Authorization is byte-exact: any signer differing from the policy
    /// address in any byte is rejected, and identical bytes are accepted.
    #[test]
    fn prop_authz_requires_byte_exact_signer(signer in proptest::collection::vec(any::<u8>(), 0..16)) {
        let policy = policy_addr();
        let msgs: Vec<Box<dyn Message>> =
            vec![update(AccountAddress::new(signer.clone()), 1)];

        let outcome = ensure_msg_authz(&msgs, &policy, &DeclaredSigners);
        if AccountAddress::new(signer) == policy {
            prop_assert!(outcome.is_ok());
        } else {
            let is_unauthorized = matches!(outcome, Err(DispatchError::Unauthorized { .. }));
            prop_assert!(is_unauthorized);
        }
    }
}
