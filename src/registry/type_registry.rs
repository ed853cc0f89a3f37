//! # In-Memory Type Registry
//!
//! Maps fully-qualified type URLs to message descriptors carrying an opaque
//! decode capability. Functional modules register their schemas here during
//! application assembly, strictly before any service registration on the
//! router; the registry is then frozen behind an `Arc` for concurrent reads.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::registry::{MessageDescriptor, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(MessageDescriptor::opaque("/bank.v1.MsgSend"));
//! assert!(registry.resolve("/bank.v1.MsgSend").is_ok());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{DispatchError, Result};
use crate::messaging::Message;

/// Decode capability for a registered message type.
///
/// Owned by the upstream codec layer; this core only stores and hands it back.
pub type MessageDecoder = Arc<dyn Fn(&[u8]) -> Result<Box<dyn Message>> + Send + Sync>;

/// A registered message schema: its type URL plus an optional decoder.
#[derive(Clone)]
pub struct MessageDescriptor {
    type_url: String,
    decoder: Option<MessageDecoder>,
}

impl MessageDescriptor {
    /// Descriptor with a decode capability supplied by the codec layer.
    pub fn new(type_url: impl Into<String>, decoder: MessageDecoder) -> Self {
        Self {
            type_url: type_url.into(),
            decoder: Some(decoder),
        }
    }

    /// Descriptor without a decoder, for types only ever constructed in
    /// process (tests, internal modules).
    pub fn opaque(type_url: impl Into<String>) -> Self {
        Self {
            type_url: type_url.into(),
            decoder: None,
        }
    }

    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    pub fn decoder(&self) -> Option<&MessageDecoder> {
        self.decoder.as_ref()
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("type_url", &self.type_url)
            .field("has_decoder", &self.decoder.is_some())
            .finish()
    }
}

/// Registry of message schemas keyed by type URL.
///
/// Registration takes `&mut self`; once assembly is complete the registry is
/// shared read-only (`Arc<TypeRegistry>`), so lookups need no locking.
#[derive(Default)]
pub struct TypeRegistry {
    descriptors: HashMap<String, MessageDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message schema. Re-registering a type URL replaces the
    /// previous descriptor; schemas are value-identical per URL so this is a
    /// warning, not an error.
    pub fn register(&mut self, descriptor: MessageDescriptor) {
        let type_url = descriptor.type_url().to_string();
        if self
            .descriptors
            .insert(type_url.clone(), descriptor)
            .is_some()
        {
            warn!(type_url = %type_url, "Replacing existing message descriptor");
        } else {
            debug!(type_url = %type_url, "Registered message descriptor");
        }
    }

    /// Resolve a type URL to its descriptor.
    ///
    /// An absent entry is a configuration defect at the call sites that
    /// matter (service registration), so the error is the fatal
    /// `UnregisteredType` variant.
    pub fn resolve(&self, type_url: &str) -> Result<&MessageDescriptor> {
        self.descriptors
            .get(type_url)
            .ok_or_else(|| DispatchError::UnregisteredType {
                type_url: type_url.to_string(),
            })
    }

    pub fn is_registered(&self, type_url: &str) -> bool {
        self.descriptors.contains_key(type_url)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[derive(Debug)]
    struct MsgEcho {
        payload: Vec<u8>,
    }

    impl Message for MsgEcho {
        fn type_url(&self) -> &str {
            "/test.v1.MsgEcho"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_descriptor_decoder_capability() {
        let decoder: MessageDecoder = Arc::new(|bytes| {
            Ok(Box::new(MsgEcho {
                payload: bytes.to_vec(),
            }))
        });

        let mut registry = TypeRegistry::new();
        registry.register(MessageDescriptor::new("/test.v1.MsgEcho", decoder));

        let descriptor = registry.resolve("/test.v1.MsgEcho").unwrap();
        let decode = descriptor.decoder().unwrap();
        let decoded = (**decode)(&[1, 2, 3]).unwrap();
        let echo = decoded.as_any().downcast_ref::<MsgEcho>().unwrap();
        assert_eq!(echo.payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TypeRegistry::new();
        registry.register(MessageDescriptor::opaque("/test.v1.MsgPing"));

        let descriptor = registry.resolve("/test.v1.MsgPing").unwrap();
        assert_eq!(descriptor.type_url(), "/test.v1.MsgPing");
        assert!(descriptor.decoder().is_none());
    }

    #[test]
    fn test_resolve_unregistered_fails() {
        let registry = TypeRegistry::new();
        let err = registry.resolve("/test.v1.MsgMissing").unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            DispatchError::UnregisteredType { type_url } if type_url == "/test.v1.MsgMissing"
        ));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = TypeRegistry::new();
        registry.register(MessageDescriptor::opaque("/test.v1.MsgPing"));
        registry.register(MessageDescriptor::opaque("/test.v1.MsgPing"));
        assert_eq!(registry.len(), 1);
    }
}
