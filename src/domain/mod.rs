//! Domain layer: client identity, connection handles, and the registry.
//!
//! This module contains the relay's connection model: the caller-supplied
//! client identifier, the outbound handle seam every transport implements,
//! and the registry that tracks live connections under concurrent churn.

pub mod client_id;
pub mod connection;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use client_id::ClientId;
pub use connection::{ConnectionHandle, ConnectionRecord, SharedHandle};
pub use registry::ConnectionRegistry;
