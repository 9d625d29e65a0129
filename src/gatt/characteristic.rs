use enumflags2::BitFlags;
use static_assertions::assert_impl_all;
use std::fmt;

use crate::uuid::Uuid;
use super::descriptor::DescriptorId;
use super::service::ServiceId;

/// Characteristic properties field as defined by the GATT specification.
#[derive(BitFlags, Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Property {
    Broadcast                       = 0x01,
    Read                            = 0x02,
    WriteWithoutResponse            = 0x04,
    Write                           = 0x08,
    Notify                          = 0x10,
    Indicate                        = 0x20,
    AuthenticatedSignedWrites       = 0x40,
    ExtendedProperties              = 0x80,
}

#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Properties(BitFlags<Property>);

impl Properties {
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(BitFlags::from_bits_truncate(bits))
    }

    pub fn bits(&self) -> u8 {
        self.0.bits()
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self(BitFlags::empty())
    }
}

impl From<BitFlags<Property>> for Properties {
    fn from(v: BitFlags<Property>) -> Self {
        Self(v)
    }
}

impl From<Property> for Properties {
    fn from(v: Property) -> Self {
        Self(v.into())
    }
}

macro_rules! properties {
    ($($(#[$attr:meta])* $f:ident => $e:ident,)*) => {
        impl Properties {
            $(
                $(#[$attr])*
                pub fn $f(&self) -> bool {
                    self.0.contains(Property::$e)
                }
            )*
        }
    };
}

properties!(
    #[doc="Characteristic can broadcast its value using a server characteristic configuration descriptor."]
    is_broadcast => Broadcast,

    #[doc="The characteristic’s value can be read."]
    is_read => Read,

    #[doc="The characteristic’s value can be written without a response."]
    is_write_without_response => WriteWithoutResponse,

    #[doc="The characteristic’s value can be written with a response."]
    is_write => Write,

    #[doc="The peripheral can notify value changes without acknowledgement."]
    is_notify => Notify,

    #[doc="The peripheral can indicate value changes, acknowledged by the client."]
    is_indicate => Indicate,

    #[doc="The characteristic’s value can be written with a signed write."]
    is_authenticated_signed_writes => AuthenticatedSignedWrites,

    #[doc="The characteristic defines additional properties in the extended properties descriptor."]
    is_extended_properties => ExtendedProperties,
);

assert_impl_all!(Properties: Send, Sync);

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Properties")
            .field(&crate::util::BitFlagsDebug(self.0))
            .finish()
    }
}

/// Address of a characteristic within one service instance.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CharacteristicId {
    service: ServiceId,
    uuid: Uuid,
}

impl CharacteristicId {
    pub const fn new(service: ServiceId, uuid: Uuid) -> Self {
        Self { service, uuid }
    }

    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn descriptor(&self, uuid: Uuid) -> DescriptorId {
        DescriptorId::new(*self, uuid)
    }
}

impl fmt::Display for CharacteristicId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{:?}", self.service, self.uuid)
    }
}

/// Characteristic as reported by the transport during discovery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CharacteristicDescriptor {
    pub uuid: Uuid,
    pub properties: Properties,
    pub descriptors: Vec<Uuid>,
}

impl CharacteristicDescriptor {
    pub fn new(uuid: Uuid, properties: impl Into<Properties>) -> Self {
        Self {
            uuid,
            properties: properties.into(),
            descriptors: Vec::new(),
        }
    }

    pub fn with_descriptor(mut self, uuid: Uuid) -> Self {
        self.descriptors.push(uuid);
        self
    }

    pub fn has_descriptor(&self, uuid: Uuid) -> bool {
        self.descriptors.contains(&uuid)
    }
}
