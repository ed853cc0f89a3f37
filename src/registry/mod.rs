//! # Type Registry
//!
//! Registration and lookup of message schemas. The router consults the
//! registry at service-registration time to enforce the
//! schema-before-service precondition; it never decodes wire bytes itself.

pub mod type_registry;

pub use type_registry::{MessageDecoder, MessageDescriptor, TypeRegistry};
