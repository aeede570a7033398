//! Register/Query contract on top of the [`Registry`] store.
//!
//! Both the gRPC and the HTTP front-ends call into [`RegistryService`]; they
//! only translate wire messages into the raw strings and numbers taken here
//! and map the returned [`Error`] onto their own status codes.

use registry_common::{checked_port, Error, Result, ServiceIdentity, ServiceRecord};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::storage::Registry;

/// Acknowledgement returned by a successful registration.
pub const REGISTER_ACK: &str = "200 OK";

/// Transport-independent registry operations.
#[derive(Clone, Default)]
pub struct RegistryService {
    registry: Registry,
}

impl RegistryService {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// The store behind this service.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Validates and records a service location.
    ///
    /// Any earlier registration under the same `(name, version)` is replaced.
    pub fn register(&self, name: &str, version: &str, host: &str, port: i64) -> Result<String> {
        let record = ServiceIdentity::new(name, version)
            .and_then(|identity| ServiceRecord::new(identity, host, checked_port(port)?))
            .map_err(|e| {
                warn!("Rejected registration [{}:{}] from [{}:{}]: {}", name, version, host, port, e);
                e
            })?;

        self.register_record(record)
    }

    /// Records an already validated service location.
    pub fn register_record(&self, record: ServiceRecord) -> Result<String> {
        info!(
            "Registered new model [{}] from [{}]",
            record.identity(),
            record.address()
        );
        self.registry.upsert(record);

        Ok(REGISTER_ACK.to_string())
    }

    /// Resolves `(name, version)` to its current record.
    ///
    /// A malformed identity can never have been registered, so it is rejected
    /// as [`Error::InvalidIdentity`] without consulting the store.
    pub fn query(&self, name: &str, version: &str) -> Result<Arc<ServiceRecord>> {
        let identity = ServiceIdentity::new(name, version)?;
        self.query_identity(&identity)
    }

    pub fn query_identity(&self, identity: &ServiceIdentity) -> Result<Arc<ServiceRecord>> {
        match self.registry.lookup(identity) {
            Ok(record) => {
                debug!("Resolved {} to {}", identity, record.address());
                Ok(record)
            }
            Err(e @ Error::NotFound { .. }) => {
                debug!("No registration for {}", identity);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// All current registrations.
    pub fn list(&self) -> Vec<Arc<ServiceRecord>> {
        self.registry.list_all()
    }
}
