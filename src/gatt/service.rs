use static_assertions::assert_impl_all;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::bus::DispatchQueue;
use crate::device::WeakDevice;
use crate::uuid::Uuid;
use super::battery::{self, BatteryService};
use super::characteristic::{CharacteristicDescriptor, CharacteristicId};

/// Identifies one service instance on a device.
///
/// A device may expose several instances of the same service type; the transport tells them
/// apart with `instance` (typically the service's start handle).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ServiceId {
    uuid: Uuid,
    instance: u16,
}

impl ServiceId {
    pub const fn new(uuid: Uuid, instance: u16) -> Self {
        Self { uuid, instance }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn instance(&self) -> u16 {
        self.instance
    }

    pub fn characteristic(&self, uuid: Uuid) -> CharacteristicId {
        CharacteristicId::new(*self, uuid)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}#{}", self.uuid, self.instance)
    }
}

/// Service as reported by the transport during discovery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceDescriptor {
    pub id: ServiceId,
    pub primary: bool,
    pub characteristics: Vec<CharacteristicDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(id: ServiceId) -> Self {
        Self {
            id,
            primary: true,
            characteristics: Vec::new(),
        }
    }

    pub fn with_characteristic(mut self, characteristic: CharacteristicDescriptor) -> Self {
        self.characteristics.push(characteristic);
        self
    }
}

/// Schema-specific behavior plugged into a discovered service.
///
/// Completions are routed here on the device's operation worker, before the next queued
/// operation is issued, so implementations must not block.
pub trait ServiceHandler: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn on_characteristic_read(&self, _characteristic: Uuid, _value: &[u8]) {}

    fn on_characteristic_write(&self, _characteristic: Uuid, _value: &[u8]) {}

    fn on_characteristic_changed(&self, _characteristic: Uuid, _value: &[u8]) {}

    fn on_descriptor_read(&self, _characteristic: Uuid, _descriptor: Uuid, _value: &[u8]) {}

    fn on_descriptor_write(&self, _characteristic: Uuid, _descriptor: Uuid, _value: &[u8]) {}
}

/// What a [`ServiceFactory`] gets to build a handler with.
#[derive(Clone)]
pub struct ServiceContext {
    pub device: WeakDevice,
    pub queue: DispatchQueue,
}

/// Creates handlers for discovered services. Returning `None` leaves the service generic.
pub trait ServiceFactory: Send + Sync {
    fn create(&self, context: &ServiceContext, descriptor: &ServiceDescriptor)
        -> Option<Arc<dyn ServiceHandler>>;
}

impl<F> ServiceFactory for F
    where F: Fn(&ServiceContext, &ServiceDescriptor) -> Option<Arc<dyn ServiceHandler>> + Send + Sync
{
    fn create(&self, context: &ServiceContext, descriptor: &ServiceDescriptor)
        -> Option<Arc<dyn ServiceHandler>>
    {
        self(context, descriptor)
    }
}

/// Knows the Battery Service; everything else stays generic.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultServiceFactory;

impl ServiceFactory for DefaultServiceFactory {
    fn create(&self, context: &ServiceContext, descriptor: &ServiceDescriptor)
        -> Option<Arc<dyn ServiceHandler>>
    {
        if descriptor.id.uuid() == battery::BATTERY_SERVICE {
            Some(Arc::new(BatteryService::new(context, descriptor)))
        } else {
            None
        }
    }
}

/// A service discovered during the current connection.
///
/// Services are invalidated on disconnect; objects may outlive that but are no longer routed to.
pub struct Service {
    descriptor: ServiceDescriptor,
    handler: Option<Arc<dyn ServiceHandler>>,
}

assert_impl_all!(Service: Send, Sync);

impl Service {
    pub(crate) fn new(descriptor: ServiceDescriptor, handler: Option<Arc<dyn ServiceHandler>>) -> Self {
        Self { descriptor, handler }
    }

    pub fn id(&self) -> ServiceId {
        self.descriptor.id
    }

    pub fn uuid(&self) -> Uuid {
        self.descriptor.id.uuid()
    }

    /// Indicates whether the type of service is primary or secondary.
    pub fn is_primary(&self) -> bool {
        self.descriptor.primary
    }

    pub fn characteristics(&self) -> &[CharacteristicDescriptor] {
        &self.descriptor.characteristics
    }

    pub fn characteristic(&self, uuid: Uuid) -> Option<&CharacteristicDescriptor> {
        self.descriptor.characteristics.iter().find(|c| c.uuid == uuid)
    }

    pub fn characteristic_id(&self, uuid: Uuid) -> Option<CharacteristicId> {
        self.characteristic(uuid).map(|c| self.id().characteristic(c.uuid))
    }

    pub fn handler(&self) -> Option<&Arc<dyn ServiceHandler>> {
        self.handler.as_ref()
    }

    /// Returns the plugged-in handler if it is a `T`.
    pub fn handler_as<T: ServiceHandler>(&self) -> Option<&T> {
        self.handler.as_ref()?.as_any().downcast_ref()
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Service")
            .field("id", &self.descriptor.id)
            .field("primary", &self.descriptor.primary)
            .field("characteristics", &self.descriptor.characteristics.len())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
