//! # Admission Control Contract
//!
//! The allow/deny gate the router consults before invoking any handler. A
//! `false` result or an error both abort dispatch without executing the
//! handler; an unconfigured router allows unconditionally.

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

use crate::error::Result;
use crate::execution::context::ExecutionContext;

/// Decides whether a message type may be executed right now.
///
/// Installed once on the router before service registration; consulted on
/// every dispatch thereafter. Implementations must be cheap; they sit on the
/// hot path of every message.
#[async_trait]
pub trait AdmissionController: Send + Sync {
    async fn is_allowed(&self, ctx: &ExecutionContext, msg_type_url: &str) -> Result<bool>;
}

/// Static deny-list admission controller.
///
/// Blocks exactly the configured type URLs and allows everything else; the
/// operational shape for disabling a misbehaving message type without a
/// redeploy.
#[derive(Debug, Clone, Default)]
pub struct MsgTypeFilter {
    blocked: HashSet<String>,
}

impl MsgTypeFilter {
    pub fn new(blocked: impl IntoIterator<Item = String>) -> Self {
        let blocked: HashSet<String> = blocked.into_iter().collect();
        if !blocked.is_empty() {
            warn!(count = blocked.len(), "Message type deny list active");
        }
        Self { blocked }
    }

    pub fn is_blocked(&self, type_url: &str) -> bool {
        self.blocked.contains(type_url)
    }
}

#[async_trait]
impl AdmissionController for MsgTypeFilter {
    async fn is_allowed(&self, _ctx: &ExecutionContext, msg_type_url: &str) -> Result<bool> {
        Ok(!self.is_blocked(msg_type_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::context::{HeaderInfo, MemoryStore};
    use chrono::Utc;
    use std::sync::Arc;

    fn test_ctx() -> ExecutionContext {
        ExecutionContext::new(
            HeaderInfo::new("test-chain", 1, Utc::now()),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_filter_blocks_only_listed_types() {
        let filter = MsgTypeFilter::new(vec!["/bank.v1.MsgSend".to_string()]);
        let ctx = test_ctx();

        assert!(!filter.is_allowed(&ctx, "/bank.v1.MsgSend").await.unwrap());
        assert!(filter.is_allowed(&ctx, "/bank.v1.MsgBurn").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_filter_allows_all() {
        let filter = MsgTypeFilter::default();
        let ctx = test_ctx();
        assert!(filter.is_allowed(&ctx, "/anything.v1.Msg").await.unwrap());
    }
}
