//! # Registry Common
//!
//! Types shared by every part of the service registry: the validated
//! `(name, version)` identity, the immutable service record and the error
//! taxonomy used by the store, the RPC bindings and the client.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{Error, Result};
pub use types::{checked_port, ServiceIdentity, ServiceRecord, IDENTITY_SEPARATOR};
