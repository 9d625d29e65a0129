//! Events the device reports to application listeners.
//!
//! All listener methods run on the device's [`DispatchQueue`](crate::bus::DispatchQueue).

use static_assertions::assert_impl_all;
use std::sync::Arc;

use crate::error::{Error, GattStatus};
use crate::gatt::Service;
use crate::uuid::Uuid;
use crate::{Address, ConnectionState};

/// Failures surfaced asynchronously. Synchronous misuse is returned to the caller instead.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ErrorEvent {
    /// The transport reported a non-success status for a state transition or an operation.
    /// `error` names what failed, with an [`ErrorKind::Att`](crate::ErrorKind::Att) kind for
    /// statuses in the ATT range.
    Gatt {
        status: GattStatus,
        error: Error,
    },

    /// An operation got no completion before its deadline and was abandoned.
    TimedOut {
        service: Arc<Service>,
    },

    /// The transport refused to issue an operation.
    Fatal {
        service: Arc<Service>,
        error: Error,
    },
}

assert_impl_all!(ErrorEvent: Send, Sync);

pub trait ConnectionStateListener: Send + Sync {
    fn on_connection_state_changed(&self, new_state: ConnectionState);
}

pub trait ServiceDiscoveredListener: Send + Sync {
    fn on_service_discovered(&self, service: &Arc<Service>);
}

pub trait ErrorListener: Send + Sync {
    fn on_error(&self, event: &ErrorEvent);
}

/// Notified when the device stayed unreachable for the whole watchdog period.
pub trait LongTimeNoSeeListener: Send + Sync {
    fn on_long_time_no_see(&self, device: Address);
}

pub trait CharacteristicListener: Send + Sync {
    fn on_characteristic_changed(&self, service: &Arc<Service>, characteristic: Uuid, value: &[u8]);
}

impl<F: Fn(ConnectionState) + Send + Sync> ConnectionStateListener for F {
    fn on_connection_state_changed(&self, new_state: ConnectionState) {
        self(new_state)
    }
}

impl<F: Fn(&Arc<Service>) + Send + Sync> ServiceDiscoveredListener for F {
    fn on_service_discovered(&self, service: &Arc<Service>) {
        self(service)
    }
}

impl<F: Fn(&ErrorEvent) + Send + Sync> ErrorListener for F {
    fn on_error(&self, event: &ErrorEvent) {
        self(event)
    }
}

impl<F: Fn(Address) + Send + Sync> LongTimeNoSeeListener for F {
    fn on_long_time_no_see(&self, device: Address) {
        self(device)
    }
}

impl<F: Fn(&Arc<Service>, Uuid, &[u8]) + Send + Sync> CharacteristicListener for F {
    fn on_characteristic_changed(&self, service: &Arc<Service>, characteristic: Uuid, value: &[u8]) {
        self(service, characteristic, value)
    }
}
