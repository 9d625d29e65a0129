use lazy_static::lazy_static;
use static_assertions::assert_impl_all;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const BASE_UUID_BYTES: [u8; 16] = [0, 0, 0, 0, 0, 0, 0x10, 0, 0x80, 0, 0, 0x80, 0x5F, 0x9B, 0x34, 0xFB];

lazy_static! {
    static ref ASSIGNED_NAMES: HashMap<Uuid, &'static str> = {
        let mut m = HashMap::new();
        m.insert(Uuid::from_u16(0x1800), "Generic Access");
        m.insert(Uuid::from_u16(0x1801), "Generic Attribute");
        m.insert(Uuid::from_u16(0x180a), "Device Information");
        m.insert(Uuid::from_u16(0x180d), "Heart Rate");
        m.insert(Uuid::from_u16(0x180f), "Battery Service");
        m.insert(Uuid::from_u16(0x2a00), "Device Name");
        m.insert(Uuid::from_u16(0x2a19), "Battery Level");
        m.insert(Uuid::from_u16(0x2a24), "Model Number String");
        m.insert(Uuid::from_u16(0x2a29), "Manufacturer Name String");
        m.insert(Uuid::from_u16(0x2a37), "Heart Rate Measurement");
        m.insert(Uuid::from_u16(0x2902), "Client Characteristic Configuration");
        m
    };
}

/// Bluetooth-tailored UUID.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Returns UUID with all bytes set to zero.
    pub const fn zeroed() -> Self {
        Self([0; 16])
    }

    /// Returns the Base UUID (`00000000-0000-1000-8000-00805F9B34FB`) as defined by the specs.
    pub const fn base() -> Self {
        Self(BASE_UUID_BYTES)
    }

    /// Constructs instance from the specified bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Expands an assigned 16-bit number (e.g. `0x180f`) over the Base UUID.
    pub const fn from_u16(v: u16) -> Self {
        Self::from_u32(v as u32)
    }

    /// Expands a 32-bit number over the Base UUID.
    pub const fn from_u32(v: u32) -> Self {
        let b = v.to_be_bytes();
        let mut r = BASE_UUID_BYTES;
        r[0] = b[0];
        r[1] = b[1];
        r[2] = b[2];
        r[3] = b[3];
        Self(r)
    }

    /// Constructs instance from the specified slice of variable length.
    /// The supported lengths are 2 for `uuid16`, 4 for `uuid32` and 16 for a standard UUID.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        Some(match bytes.len() {
            2 => Self::from_u16(u16::from_be_bytes([bytes[0], bytes[1]])),
            4 => Self::from_u32(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            16 => {
                let mut r = [0; 16];
                r.copy_from_slice(bytes);
                Self(r)
            }
            _ => return None,
        })
    }

    /// Returns inner bytes array.
    pub fn bytes(&self) -> [u8; 16] {
        self.0
    }

    /// Returns the shortest possible UUID that is equivalent of this UUID.
    pub fn shorten(&self) -> &[u8] {
        if self.0[4..] == BASE_UUID_BYTES[4..] {
            if self.0[0..2] == BASE_UUID_BYTES[0..2] {
                &self.0[2..4]
            } else {
                &self.0[..4]
            }
        } else {
            &self.0
        }
    }

    /// Returns the 16-bit assigned number if this UUID has one.
    pub fn as_u16(&self) -> Option<u16> {
        match self.shorten() {
            &[a, b] => Some(u16::from_be_bytes([a, b])),
            _ => None,
        }
    }

    /// Human-readable name of a well-known service, characteristic or descriptor.
    pub fn name(&self) -> Option<&'static str> {
        ASSIGNED_NAMES.get(self).copied()
    }
}

assert_impl_all!(Uuid: Send, Sync);

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3],
            self.0[4], self.0[5], self.0[6], self.0[7],
            self.0[8], self.0[9], self.0[10], self.0[11],
            self.0[12], self.0[13], self.0[14], self.0[15])
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.as_u16(), self.name()) {
            (Some(short), Some(name)) => write!(f, "Uuid({:04x} {})", short, name),
            (Some(short), None) => write!(f, "Uuid({:04x})", short),
            _ => write!(f, "Uuid({})", self),
        }
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(v: [u8; 16]) -> Self {
        Self::from_bytes(v)
    }
}

impl From<u16> for Uuid {
    fn from(v: u16) -> Self {
        Self::from_u16(v)
    }
}

/// Accepts the canonical 36-character form as well as the short `180f` and
/// `0000180f` forms, with an optional `0x` prefix on the short ones.
impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn hex(src: &str, dst: &mut [u8]) -> Result<(), UuidParseError> {
            if src.len() != dst.len() * 2 || !src.is_ascii() {
                return Err(UuidParseError(()));
            }
            for (i, d) in dst.iter_mut().enumerate() {
                *d = u8::from_str_radix(&src[i * 2..i * 2 + 2], 16)
                    .map_err(|_| UuidParseError(()))?;
            }
            Ok(())
        }

        let short = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        match short.len() {
            4 => {
                let mut b = [0; 2];
                hex(short, &mut b)?;
                return Ok(Self::from_u16(u16::from_be_bytes(b)));
            }
            8 => {
                let mut b = [0; 4];
                hex(short, &mut b)?;
                return Ok(Self::from_u32(u32::from_be_bytes(b)));
            }
            _ => {}
        }

        let groups: Vec<&str> = s.split('-').collect();
        if s.len() != 36 || groups.len() != 5 {
            return Err(UuidParseError(()));
        }
        let mut buf = [0; 16];
        let mut at = 0;
        for (group, len) in groups.iter().zip(&[4, 2, 2, 2, 6]) {
            hex(group, &mut buf[at..at + len])?;
            at += len;
        }
        Ok(Self(buf))
    }
}

#[derive(Debug)]
pub struct UuidParseError(());

impl fmt::Display for UuidParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid UUID string")
    }
}

impl std::error::Error for UuidParseError {}
