//! End-to-end routing tests: registration through dispatch with admission
//! control and per-dispatch event isolation under concurrency.

use async_trait::async_trait;
use chrono::Utc;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dispatch_core::{
    AccountAddress, AdmissionConfig, AdmissionController, CircuitBreakerController,
    DispatchConfig, Event, ExecutionContext, HeaderInfo, MemoryStore, Message, MessageDescriptor,
    MessageRouter, MethodDescriptor, MsgHandler, MsgTypeFilter, Result, ServiceDescriptor,
    TypeRegistry,
};

#[derive(Debug)]
struct MsgMint {
    to: AccountAddress,
    amount: u64,
}

impl Message for MsgMint {
    fn type_url(&self) -> &str {
        "/bank.v1.MsgMint"
    }

    fn signers(&self) -> Vec<AccountAddress> {
        vec![self.to.clone()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct MsgMintResponse {
    minted: u64,
}

impl Message for MsgMintResponse {
    fn type_url(&self) -> &str {
        "/bank.v1.MsgMintResponse"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct MsgBurn {
    amount: u64,
}

impl Message for MsgBurn {
    fn type_url(&self) -> &str {
        "/bank.v1.MsgBurn"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct MsgBurnResponse;

impl Message for MsgBurnResponse {
    fn type_url(&self) -> &str {
        "/bank.v1.MsgBurnResponse"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Mint handler: writes the balance to the store and emits one `mint` event
/// carrying the minted amount.
struct MintHandler;

#[async_trait]
impl MsgHandler for MintHandler {
    async fn handle(&self, ctx: &ExecutionContext, msg: &dyn Message) -> Result<Box<dyn Message>> {
        let request = msg.as_any().downcast_ref::<MsgMint>().unwrap();
        let key = format!("balance/{}", request.to).into_bytes();
        ctx.store().set(key, request.amount.to_be_bytes().to_vec());
        ctx.events().emit(
            Event::new("mint")
                .with_attribute("to", request.to.to_string())
                .with_attribute("amount", request.amount.to_string()),
        );
        Ok(Box::new(MsgMintResponse {
            minted: request.amount,
        }))
    }

    fn handler_name(&self) -> &str {
        "mint_handler"
    }
}

/// Burn handler: emits two `burn` events so event counts differ per type.
struct BurnHandler {
    invocations: Arc<AtomicUsize>,
}

#[async_trait]
impl MsgHandler for BurnHandler {
    async fn handle(&self, ctx: &ExecutionContext, msg: &dyn Message) -> Result<Box<dyn Message>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let request = msg.as_any().downcast_ref::<MsgBurn>().unwrap();
        ctx.events()
            .emit(Event::new("burn").with_attribute("amount", request.amount.to_string()));
        ctx.events().emit(Event::new("supply_changed"));
        Ok(Box::new(MsgBurnResponse))
    }

    fn handler_name(&self) -> &str {
        "burn_handler"
    }
}

fn bank_registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    for url in [
        "/bank.v1.MsgMint",
        "/bank.v1.MsgMintResponse",
        "/bank.v1.MsgBurn",
        "/bank.v1.MsgBurnResponse",
    ] {
        registry.register(MessageDescriptor::opaque(url));
    }
    Arc::new(registry)
}

fn bank_service(burn_invocations: Arc<AtomicUsize>) -> ServiceDescriptor {
    ServiceDescriptor::new("bank.v1.Msg")
        .with_method(MethodDescriptor::new(
            "Mint",
            "/bank.v1.MsgMint",
            "/bank.v1.MsgMintResponse",
            Arc::new(MintHandler),
        ))
        .with_method(MethodDescriptor::new(
            "Burn",
            "/bank.v1.MsgBurn",
            "/bank.v1.MsgBurnResponse",
            Arc::new(BurnHandler {
                invocations: burn_invocations,
            }),
        ))
}

fn test_ctx() -> ExecutionContext {
    ExecutionContext::new(
        HeaderInfo::new("test-chain", 100, Utc::now()),
        Arc::new(MemoryStore::new()),
    )
}

#[tokio::test]
async fn test_full_registration_and_dispatch_flow() {
    let mut router = MessageRouter::new(bank_registry());
    router
        .register_service(bank_service(Arc::new(AtomicUsize::new(0))))
        .unwrap();
    let router = Arc::new(router);

    assert_eq!(router.route_count(), 2);
    assert_eq!(
        router.response_name_by_msg_name("/bank.v1.MsgMint"),
        Some("/bank.v1.MsgMintResponse".to_string())
    );

    let ctx = test_ctx();
    let alice = AccountAddress::new(vec![1; 4]);
    let result = router
        .invoke(
            &ctx,
            &MsgMint {
                to: alice.clone(),
                amount: 250,
            },
        )
        .await
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].name, "mint");
    let response = result.msg_responses[0]
        .as_any()
        .downcast_ref::<MsgMintResponse>()
        .unwrap();
    assert_eq!(response.minted, 250);

    // The handler's store write went through the shared store capability.
    let key = format!("balance/{alice}").into_bytes();
    assert_eq!(ctx.store().get(&key), Some(250u64.to_be_bytes().to_vec()));
}

#[tokio::test]
async fn test_concurrent_dispatches_never_share_events() {
    let mut router = MessageRouter::new(bank_registry());
    router
        .register_service(bank_service(Arc::new(AtomicUsize::new(0))))
        .unwrap();
    let router = Arc::new(router);
    let ctx = test_ctx();

    let mut tasks = Vec::new();
    for i in 0..64u64 {
        let router = Arc::clone(&router);
        let ctx = ctx.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                let result = router
                    .invoke(
                        &ctx,
                        &MsgMint {
                            to: AccountAddress::new(i.to_be_bytes().to_vec()),
                            amount: i,
                        },
                    )
                    .await
                    .unwrap();
                // Exactly this dispatch's mint event, nothing from burns.
                assert_eq!(result.events.len(), 1);
                assert_eq!(result.events[0].name, "mint");
                assert_eq!(result.events[0].attributes[1].value, i.to_string());
            } else {
                let result = router
                    .invoke(&ctx, &MsgBurn { amount: i })
                    .await
                    .unwrap();
                assert_eq!(result.events.len(), 2);
                assert_eq!(result.events[0].name, "burn");
                assert_eq!(result.events[0].attributes[0].value, i.to_string());
                assert_eq!(result.events[1].name, "supply_changed");
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    // The shared outer context collected none of the dispatch-scoped events.
    assert!(ctx.events().is_empty());
}

#[tokio::test]
async fn test_circuit_breaker_trips_single_message_type() {
    let admission = AdmissionConfig {
        failure_threshold: 3,
        open_timeout_secs: 3600,
        ..AdmissionConfig::default()
    };

    let controller = Arc::new(CircuitBreakerController::new(
        admission.circuit_breaker_config(),
    ));
    let burn_invocations = Arc::new(AtomicUsize::new(0));

    let mut router = MessageRouter::new(bank_registry());
    router
        .set_admission_controller(Arc::clone(&controller) as Arc<dyn AdmissionController>)
        .unwrap();
    router
        .register_service(bank_service(Arc::clone(&burn_invocations)))
        .unwrap();
    let router = Arc::new(router);
    let ctx = test_ctx();

    // Three reported failures trip the burn route.
    for _ in 0..3 {
        controller.record_outcome("/bank.v1.MsgBurn", false);
    }

    let err = router
        .invoke(&ctx, &MsgBurn { amount: 1 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        dispatch_core::DispatchError::Disallowed { .. }
    ));
    assert_eq!(burn_invocations.load(Ordering::SeqCst), 0);

    // Mint is keyed separately and still executes.
    let result = router
        .invoke(
            &ctx,
            &MsgMint {
                to: AccountAddress::new(vec![9]),
                amount: 5,
            },
        )
        .await;
    assert!(result.is_ok());

    // Operator override reopens the burn route.
    controller.force_closed("/bank.v1.MsgBurn");
    router
        .invoke(&ctx, &MsgBurn { amount: 1 })
        .await
        .unwrap();
    assert_eq!(burn_invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_config_driven_deny_list_blocks_dispatch() {
    let mut config = DispatchConfig::default();
    config
        .admission
        .blocked_message_types
        .push("/bank.v1.MsgBurn".to_string());

    let filter = MsgTypeFilter::new(config.admission.blocked_message_types.clone());
    let burn_invocations = Arc::new(AtomicUsize::new(0));

    let mut router = MessageRouter::new(bank_registry());
    router.set_admission_controller(Arc::new(filter)).unwrap();
    router
        .register_service(bank_service(Arc::clone(&burn_invocations)))
        .unwrap();
    let ctx = test_ctx();

    let err = router
        .invoke(&ctx, &MsgBurn { amount: 1 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        dispatch_core::DispatchError::Disallowed { .. }
    ));
    assert_eq!(burn_invocations.load(Ordering::SeqCst), 0);

    // Unlisted types are unaffected.
    assert!(router
        .invoke(
            &ctx,
            &MsgMint {
                to: AccountAddress::new(vec![2]),
                amount: 10,
            },
        )
        .await
        .is_ok());
}
