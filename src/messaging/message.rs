//! # Message Model
//!
//! [`Message`] is the contract every routable request and response satisfies:
//! a globally unique type URL, optional self-validation, and the signer
//! addresses the message declares. Handlers downcast through
//! [`Message::as_any`] to recover their concrete request type.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::messaging::{AccountAddress, Message};
//! use std::any::Any;
//!
//! #[derive(Debug)]
//! struct MsgSend {
//!     from: AccountAddress,
//!     amount: u64,
//! }
//!
//! impl Message for MsgSend {
//!     fn type_url(&self) -> &str {
//!         "/bank.v1.MsgSend"
//!     }
//!
//!     fn signers(&self) -> Vec<AccountAddress> {
//!         vec![self.from.clone()]
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

use crate::error::Result;

/// A principal's account address. Comparison is byte-exact; display is hex.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountAddress(Vec<u8>);

impl AccountAddress {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({self})")
    }
}

impl From<&[u8]> for AccountAddress {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// A decoded, typed message.
///
/// The type URL is the routing key: at most one handler is registered per URL
/// for the lifetime of the router. `validate_basic` is stateless
/// self-validation run before admission control and the handler; the default
/// accepts everything for message types without internal invariants.
pub trait Message: fmt::Debug + Send + Sync {
    /// Fully-qualified type URL, e.g. `/bank.v1.MsgSend`.
    fn type_url(&self) -> &str;

    /// Stateless self-validation. Runs before admission control; a failure
    /// means the handler is never invoked.
    fn validate_basic(&self) -> Result<()> {
        Ok(())
    }

    /// Signer addresses this message declares, in declaration order.
    fn signers(&self) -> Vec<AccountAddress> {
        Vec::new()
    }

    /// Downcast support for handlers recovering their concrete request type.
    fn as_any(&self) -> &dyn Any;
}

/// Capability to resolve the required signers of a message.
///
/// Injected into the authorization guard so that signer derivation (normally
/// a codec concern) stays outside this core.
pub trait SignerResolver: Send + Sync {
    fn resolve_signers(&self, msg: &dyn Message) -> Result<Vec<AccountAddress>>;
}

/// Resolver that trusts the signers a message declares about itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredSigners;

impl SignerResolver for DeclaredSigners {
    fn resolve_signers(&self, msg: &dyn Message) -> Result<Vec<AccountAddress>> {
        Ok(msg.signers())
    }
}
