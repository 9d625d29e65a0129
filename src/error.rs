use std::fmt;
use std::io;

#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    description: String,
}

impl Error {
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    /// Builds an error from a non-success status reported by the transport.
    pub fn from_status(status: GattStatus, what: impl fmt::Display) -> Self {
        let kind = match status.att_error_kind() {
            Some(att) => ErrorKind::Att(att),
            None => ErrorKind::Other,
        };
        Self::new(kind, format!("{} failed with status {}", what, status))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::new(ErrorKind::Other, e.to_string())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Error that didn't map to any of the existing variants.
    Other,

    /// A configuration value is out of range.
    InvalidParameters,

    /// The device isn’t currently connected.
    NotConnected,

    /// The device is already connecting or connected.
    AlreadyConnected,

    /// The transport couldn't open a link to the device.
    ConnectionFailed,

    /// No service with the given identifier is registered for the current connection.
    UnknownService,

    /// The service has no characteristic with the given UUID.
    UnknownCharacteristic,

    /// The characteristic has no descriptor with the given UUID.
    UnknownDescriptor,

    /// The operation isn’t supported by the attribute.
    OperationNotSupported,

    /// The device has been discarded and its worker is gone.
    Closed,

    /// The peripheral answered with an ATT error.
    Att(AttErrorKind),
}

/// Raw status code reported by the transport for a state transition or an operation.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct GattStatus(u16);

impl GattStatus {
    pub const SUCCESS: Self = Self(0);

    /// Generic failure not covered by an ATT error code.
    pub const FAILURE: Self = Self(0x101);

    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn code(&self) -> u16 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Returns the ATT error this status stands for, if it is in the ATT range.
    pub fn att_error_kind(&self) -> Option<AttErrorKind> {
        if self.0 <= 0xff {
            Some(AttErrorKind::from_code(self.0))
        } else {
            None
        }
    }
}

impl fmt::Display for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl fmt::Debug for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.att_error_kind() {
            Some(kind) => write!(f, "GattStatus({}, {:?})", self, kind),
            None => write!(f, "GattStatus({})", self),
        }
    }
}

impl From<u16> for GattStatus {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// ATT error code carried by a failed [`GattStatus`] (codes 0x00 to 0x11).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum AttErrorKind {
    /// A code in the ATT range without a variant here, e.g. an application error (0x80..).
    Other,

    Success,
    InvalidHandle,
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidPdu,

    /// The peripheral wants an authenticated (paired) link for this attribute.
    InsufficientAuthentication,

    RequestNotSupported,
    InvalidOffset,
    InsufficientAuthorization,
    PrepareQueueFull,
    AttributeNotFound,

    /// The value has to be read with blob requests.
    AttributeNotLong,

    InsufficientEncryptionKeySize,
    InvalidAttributeValueLength,
    UnlikelyError,

    /// The link must be encrypted first.
    InsufficientEncryption,

    UnsupportedGroupType,
    InsufficientResources,
}

impl AttErrorKind {
    fn from_code(code: u16) -> Self {
        use AttErrorKind::*;
        match code {
            0x00 => Success,
            0x01 => InvalidHandle,
            0x02 => ReadNotPermitted,
            0x03 => WriteNotPermitted,
            0x04 => InvalidPdu,
            0x05 => InsufficientAuthentication,
            0x06 => RequestNotSupported,
            0x07 => InvalidOffset,
            0x08 => InsufficientAuthorization,
            0x09 => PrepareQueueFull,
            0x0a => AttributeNotFound,
            0x0b => AttributeNotLong,
            0x0c => InsufficientEncryptionKeySize,
            0x0d => InvalidAttributeValueLength,
            0x0e => UnlikelyError,
            0x0f => InsufficientEncryption,
            0x10 => UnsupportedGroupType,
            0x11 => InsufficientResources,
            _ => Other,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_kinds() {
        assert!(GattStatus::SUCCESS.is_success());
        assert!(!GattStatus::FAILURE.is_success());
        assert_eq!(GattStatus::new(0x02).att_error_kind(), Some(AttErrorKind::ReadNotPermitted));
        assert_eq!(GattStatus::new(0x85).att_error_kind(), Some(AttErrorKind::Other));
        assert_eq!(GattStatus::FAILURE.att_error_kind(), None);
    }

    #[test]
    fn from_status() {
        let e = Error::from_status(GattStatus::new(0x03), "write");
        assert_eq!(e.kind(), ErrorKind::Att(AttErrorKind::WriteNotPermitted));
        assert_eq!(e.to_string(), "write failed with status 0x03");

        let e = Error::from_status(GattStatus::FAILURE, "read");
        assert_eq!(e.kind(), ErrorKind::Other);
    }
}
