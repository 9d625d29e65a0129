//! GATT attribute model: identifiers, discovered services and the per-connection registry.

pub mod battery;
pub mod characteristic;
pub mod descriptor;
pub mod registry;
pub mod service;

pub use characteristic::{CharacteristicDescriptor, CharacteristicId, Properties, Property};
pub use descriptor::DescriptorId;
pub use registry::ServiceRegistry;
pub use service::{DefaultServiceFactory, Service, ServiceContext, ServiceDescriptor, ServiceFactory,
    ServiceHandler, ServiceId};

/// Target of a single GATT operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeId {
    Characteristic(CharacteristicId),
    Descriptor(DescriptorId),
}

impl AttributeId {
    pub fn service(&self) -> ServiceId {
        match self {
            Self::Characteristic(c) => c.service(),
            Self::Descriptor(d) => d.characteristic().service(),
        }
    }
}

impl From<CharacteristicId> for AttributeId {
    fn from(v: CharacteristicId) -> Self {
        Self::Characteristic(v)
    }
}

impl From<DescriptorId> for AttributeId {
    fn from(v: DescriptorId) -> Self {
        Self::Descriptor(v)
    }
}
