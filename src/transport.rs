//! Contract with the platform radio stack.
//!
//! A [`Transport`] opens one [`Session`] per connection attempt. Requests issued on a session
//! complete asynchronously: the transport reports every completion, state change and
//! notification through the [`EventSink`] it was handed in [`Transport::open`].
//!
//! Every read and write carries a [`RequestId`]. The transport echoes it on the matching
//! completion so a completion that arrives after its operation was abandoned is never taken
//! for the result of a later request on the same attribute.
//!
//! Events may be delivered from any thread, including synchronously from inside a [`Session`]
//! request. The only exception is [`Transport::open`]: the session doesn't exist yet while it
//! runs, so events must come from another thread.

use log::*;
use static_assertions::assert_impl_all;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::device::Shared;
use crate::error::{Error, GattStatus};
use crate::gatt::{CharacteristicId, DescriptorId, ServiceDescriptor};
use crate::{Address, ConnectionState};

/// Tag of one issued request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn new(v: u64) -> Self {
        Self(v)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait Transport: Send + Sync {
    /// Starts connecting to `address`. With `auto_connect` the transport keeps retrying on its
    /// own after link loss until it gives up.
    fn open(&self, address: Address, auto_connect: bool, sink: EventSink)
        -> Result<Arc<dyn Session>, Error>;
}

/// An open link to one peripheral. Every request returns as soon as it is issued; `Err` means
/// the transport refused to issue it.
pub trait Session: Send + Sync {
    fn discover_services(&self) -> Result<(), Error>;

    fn read_characteristic(&self, request: RequestId, characteristic: &CharacteristicId)
        -> Result<(), Error>;

    fn write_characteristic(&self, request: RequestId, characteristic: &CharacteristicId, value: &[u8])
        -> Result<(), Error>;

    fn read_descriptor(&self, request: RequestId, descriptor: &DescriptorId) -> Result<(), Error>;

    fn write_descriptor(&self, request: RequestId, descriptor: &DescriptorId, value: &[u8])
        -> Result<(), Error>;

    /// Enables or disables local delivery of notifications for the characteristic. This doesn't
    /// touch the peripheral; the configuration descriptor is written separately.
    fn set_notification(&self, characteristic: &CharacteristicId, enable: bool) -> Result<(), Error>;

    /// Requests link teardown; completion is reported as a state change.
    fn disconnect(&self);

    /// Releases the session. No events are expected afterwards.
    fn close(&self);
}

#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum TransportEvent {
    ConnectionStateChanged {
        status: GattStatus,
        new_state: ConnectionState,
    },

    ServicesDiscovered {
        status: GattStatus,
        services: Vec<ServiceDescriptor>,
    },

    CharacteristicRead {
        request: RequestId,
        characteristic: CharacteristicId,
        status: GattStatus,
        value: Vec<u8>,
    },

    CharacteristicWrite {
        request: RequestId,
        characteristic: CharacteristicId,
        status: GattStatus,
        value: Vec<u8>,
    },

    /// Unsolicited notification or indication.
    CharacteristicChanged {
        characteristic: CharacteristicId,
        value: Vec<u8>,
    },

    DescriptorRead {
        request: RequestId,
        descriptor: DescriptorId,
        status: GattStatus,
        value: Vec<u8>,
    },

    DescriptorWrite {
        request: RequestId,
        descriptor: DescriptorId,
        status: GattStatus,
        value: Vec<u8>,
    },

    RssiRead {
        status: GattStatus,
        rssi: i16,
    },
}

assert_impl_all!(TransportEvent: Send, Sync);

/// Where a transport reports events for one device. Events arriving after the device has been
/// discarded are dropped.
#[derive(Clone)]
pub struct EventSink {
    shared: Weak<Shared>,
}

assert_impl_all!(EventSink: Send, Sync);

impl EventSink {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    pub fn send(&self, event: TransportEvent) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_transport_event(event),
            None => trace!("device is gone, dropping {:?}", event),
        }
    }
}
