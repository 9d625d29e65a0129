//! GATT client connection layer for Bluetooth Low Energy peripherals.
//!
//! A [`Device`] drives the connection to one peripheral over a platform [`Transport`]: it
//! tracks the connection state, discovers services after connecting and serializes every GATT
//! read and write so at most one request per device is outstanding at a time. Operations that
//! get no answer within the configured timeout are abandoned and reported.
//!
//! Everything asynchronous is reported to listeners: connection state changes, discovered
//! services, errors, characteristic value changes, and "long time no see" when a device stayed
//! unreachable for the watchdog period. Listeners are held by weak reference and called on the
//! device's [`DispatchQueue`](bus::DispatchQueue), one event at a time.
//!
//! Service-specific behavior is plugged in through [`ServiceFactory`](gatt::ServiceFactory).
//! The default factory knows the Battery Service.
//!
//! ## Example
//!
//! ```no_run
//! use gatt_link::*;
//! use gatt_link::gatt::battery::{BatteryLevel, BatteryService};
//! use std::sync::Arc;
//!
//! fn monitor(transport: Arc<dyn Transport>) -> Result<(), Error> {
//!     let device = Device::new("AA:BB:CC:DD:EE:FF".parse().unwrap(), transport)?;
//!
//!     let on_state = Arc::new(|state: ConnectionState| println!("{}", state));
//!     device.add_connection_state_listener(&on_state);
//!
//!     let on_battery = Arc::new(|level: BatteryLevel| println!("battery {}", level));
//!     let on_service = Arc::new(move |service: &Arc<Service>| {
//!         if let Some(battery) = service.handler_as::<BatteryService>() {
//!             battery.add_battery_level_listener(&on_battery);
//!         }
//!     });
//!     device.add_service_discovered_listener(&on_service);
//!
//!     device.connect(false)?;
//!
//!     // Listeners are only weakly referenced: keep them alive while they're needed.
//!     std::thread::sleep(std::time::Duration::from_secs(60));
//!     Ok(())
//! }
//! ```
//!
//! A runnable version against a simulated peripheral lives in `demos/battery_monitor.rs`.
#![deny(dead_code)]
#![deny(non_snake_case)]
#![deny(unused_imports)]
#![deny(unused_must_use)]

#[macro_use]
mod macros;

pub mod bus;
pub mod device;
pub mod error;
pub mod event;
pub mod gatt;
#[cfg(test)]
mod mock;
mod sync;
pub mod transport;
pub mod uuid;
mod util;

use std::fmt;

pub use device::{Device, DeviceBuilder, WeakDevice};
pub use error::{Error, ErrorKind, GattStatus};
pub use event::{CharacteristicListener, ConnectionStateListener, ErrorEvent, ErrorListener,
    LongTimeNoSeeListener, ServiceDiscoveredListener};
pub use gatt::Service;
pub use transport::{EventSink, RequestId, Session, Transport, TransportEvent};
pub use uuid::Uuid;

/// Hardware address of a peripheral.
pub use macaddr::MacAddr6 as Address;

/// Connection state of a [`Device`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ConnectionState {
    Disconnected = 0,

    /// Waiting for the link to come up, including while the transport retries after link loss.
    Connecting = 1,

    Connected = 2,

    /// Teardown was requested and the transport hasn't confirmed it yet.
    Disconnecting = 3,
}

impl ConnectionState {
    /// Maps the platform's state code.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Disconnecting,
            _ => return None,
        })
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}
