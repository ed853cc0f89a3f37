//! # Messaging Abstractions
//!
//! The decoded-message model shared by the router, the admission layer, and
//! the policy executor. Wire encoding and decoding happen upstream; by the
//! time a message reaches this crate it is a typed value identified by its
//! fully-qualified type URL.

pub mod message;

pub use message::{AccountAddress, DeclaredSigners, Message, SignerResolver};
