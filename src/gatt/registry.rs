use log::*;
use std::sync::Arc;

use crate::uuid::Uuid;
use super::service::{Service, ServiceId};

/// Services discovered during the current connection, in discovery order.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// First service of the given type.
    pub fn get(&self, uuid: Uuid) -> Option<Arc<Service>> {
        self.services.iter().find(|s| s.uuid() == uuid).cloned()
    }

    /// Every instance of the given service type.
    pub fn get_all(&self, uuid: Uuid) -> Vec<Arc<Service>> {
        self.services.iter().filter(|s| s.uuid() == uuid).cloned().collect()
    }

    pub fn all(&self) -> Vec<Arc<Service>> {
        self.services.clone()
    }

    /// Exact service instance.
    pub fn find(&self, id: ServiceId) -> Option<Arc<Service>> {
        self.services.iter().find(|s| s.id() == id).cloned()
    }

    /// Whether `service` is the currently registered instance (and not a leftover of an
    /// earlier connection with the same identifier).
    pub fn is_current(&self, service: &Arc<Service>) -> bool {
        self.services.iter().any(|s| Arc::ptr_eq(s, service))
    }

    /// Looks up the owner of an inbound event. Routing failures are logged and yield `None`.
    pub fn route(&self, id: ServiceId, what: &str) -> Option<Arc<Service>> {
        let r = self.find(id);
        if r.is_none() {
            error!("{}: unregistered service {}, dropping event", what, id);
        }
        r
    }

    /// Replaces the whole registry with a fresh discovery result.
    pub fn replace(&mut self, services: Vec<Arc<Service>>) {
        self.services = services;
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
