//! # Service Registry
//!
//! Lets worker services announce where they listen under a
//! `(name, version)` identity, and lets clients resolve that identity back
//! to a location.
//!
//! This crate provides:
//! - In-memory registry storage (thread-safe with DashMap)
//! - The Register/Query service, exposed over gRPC and optionally HTTP/JSON
//! - Optional TLS for the gRPC transport
//! - A gRPC client plus standalone server and demo client executables

pub mod api;
pub mod client;
pub mod config;
pub mod grpc;
pub mod server;
pub mod service;
pub mod storage;
pub mod transport;
pub mod types;

/// Generated protobuf messages and gRPC stubs.
pub mod pb {
    tonic::include_proto!("registry.v1");
}

// Re-export commonly used items
pub use client::RegistryClient;
pub use config::{ClientConfig, RegistryConfig};
pub use server::RegistryServer;
pub use service::RegistryService;
pub use storage::Registry;
