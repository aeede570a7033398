//! In-memory storage for the service registry.
//!
//! The store is the only owner of the identity → record mapping. It is a
//! sharded concurrent map, so writes to different identities rarely contend
//! and a reader never observes a half-written record: values are
//! `Arc<ServiceRecord>` and are swapped in whole.

use dashmap::DashMap;
use registry_common::{Error, Result, ServiceIdentity, ServiceRecord};
use std::sync::Arc;

/// Thread-safe in-memory registry storage.
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Clone, Default)]
pub struct Registry {
    services: Arc<DashMap<ServiceIdentity, Arc<ServiceRecord>>>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` under its identity, replacing whatever was there.
    ///
    /// Returns the record that was superseded, if any. Never fails: the
    /// latest registration always wins.
    pub fn upsert(&self, record: ServiceRecord) -> Option<Arc<ServiceRecord>> {
        let identity = record.identity().clone();
        let previous = self.services.insert(identity.clone(), Arc::new(record));

        match &previous {
            Some(old) => tracing::debug!("Replaced registration for {} (was {})", identity, old.address()),
            None => tracing::debug!("Inserted registration for {}", identity),
        }

        previous
    }

    /// Returns the most recent record registered under `identity`.
    pub fn lookup(&self, identity: &ServiceIdentity) -> Result<Arc<ServiceRecord>> {
        self.services
            .get(identity)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::not_found(identity.clone()))
    }

    /// Snapshot of every current registration, ordered by identity text.
    pub fn list_all(&self) -> Vec<Arc<ServiceRecord>> {
        let mut records: Vec<_> = self
            .services
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        records.sort_by_key(|record| record.identity().to_string());
        records
    }

    /// Returns the number of registered services.
    pub fn count(&self) -> usize {
        self.services.len()
    }
}
