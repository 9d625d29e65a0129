use std::fmt;

use crate::uuid::Uuid;
use super::characteristic::CharacteristicId;

/// Client Characteristic Configuration descriptor, used to enable notifications and indications.
pub const CLIENT_CHARACTERISTIC_CONFIGURATION: Uuid = Uuid::from_u16(0x2902);

pub const ENABLE_NOTIFICATION_VALUE: [u8; 2] = [0x01, 0x00];
pub const ENABLE_INDICATION_VALUE: [u8; 2] = [0x02, 0x00];
pub const DISABLE_NOTIFICATION_VALUE: [u8; 2] = [0x00, 0x00];

/// Address of a descriptor attached to a characteristic.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DescriptorId {
    characteristic: CharacteristicId,
    uuid: Uuid,
}

impl DescriptorId {
    pub const fn new(characteristic: CharacteristicId, uuid: Uuid) -> Self {
        Self { characteristic, uuid }
    }

    pub fn characteristic(&self) -> CharacteristicId {
        self.characteristic
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{:?}", self.characteristic, self.uuid)
    }
}
