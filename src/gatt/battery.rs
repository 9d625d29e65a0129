//! Battery Service (0x180F).

use log::*;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::bus::EventBus;
use crate::device::WeakDevice;
use crate::event::CharacteristicListener;
use crate::sync::lock;
use crate::uuid::Uuid;
use super::characteristic::CharacteristicId;
use super::service::{Service, ServiceContext, ServiceDescriptor, ServiceHandler};

pub const BATTERY_SERVICE: Uuid = Uuid::from_u16(0x180f);
pub const BATTERY_LEVEL: Uuid = Uuid::from_u16(0x2a19);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatteryLevel {
    /// Not read yet.
    Unknown,

    /// The service has no Battery Level characteristic.
    Unavailable,

    Percent(u8),
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Unavailable => f.write_str("unavailable"),
            Self::Percent(v) => write!(f, "{}%", v),
        }
    }
}

pub trait BatteryLevelListener: Send + Sync {
    fn on_battery_level_changed(&self, level: BatteryLevel);
}

impl<F: Fn(BatteryLevel) + Send + Sync> BatteryLevelListener for F {
    fn on_battery_level_changed(&self, level: BatteryLevel) {
        self(level)
    }
}

/// The service's share in the level characteristic's subscription. Values reach the service
/// through its handler, so there's nothing to do here.
struct LevelSubscription;

impl CharacteristicListener for LevelSubscription {
    fn on_characteristic_changed(&self, _service: &Arc<Service>, _characteristic: Uuid, _value: &[u8]) {}
}

pub struct BatteryService {
    device: WeakDevice,
    characteristic: Option<CharacteristicId>,
    level: Mutex<BatteryLevel>,
    listeners: EventBus<dyn BatteryLevelListener>,
    subscription: Arc<LevelSubscription>,
}

impl BatteryService {
    pub fn new(context: &ServiceContext, descriptor: &ServiceDescriptor) -> Self {
        let characteristic = descriptor.characteristics.iter()
            .find(|c| c.uuid == BATTERY_LEVEL)
            .map(|c| descriptor.id.characteristic(c.uuid));
        let level = if characteristic.is_some() {
            BatteryLevel::Unknown
        } else {
            error!("battery service {} has no battery level characteristic", descriptor.id);
            BatteryLevel::Unavailable
        };
        Self {
            device: context.device.clone(),
            characteristic,
            level: Mutex::new(level),
            listeners: EventBus::new(context.queue.clone()),
            subscription: Arc::new(LevelSubscription),
        }
    }

    /// Current level. While it's unknown, each call queues a read; listeners hear about the
    /// result.
    pub fn level(&self) -> BatteryLevel {
        let level = *lock(&self.level);
        if level == BatteryLevel::Unknown {
            if let (Some(characteristic), Some(device)) = (&self.characteristic, self.device.upgrade()) {
                if let Err(e) = device.read_characteristic(characteristic) {
                    warn!("couldn't read battery level: {}", e);
                }
            }
        }
        level
    }

    /// Returns `false` if already registered. The service holds one characteristic listener on
    /// the level while it has any listener of its own, so notifications stay enabled as long as
    /// either kind is registered.
    pub fn add_battery_level_listener<L: BatteryLevelListener + 'static>(&self, listener: &Arc<L>) -> bool {
        let listener: Arc<dyn BatteryLevelListener> = listener.clone();
        let was_empty = self.listeners.is_empty();
        let r = self.listeners.register(&listener);
        if r && was_empty {
            self.set_notification(true);
        }
        r
    }

    pub fn remove_battery_level_listener<L: BatteryLevelListener + 'static>(&self, listener: &Arc<L>) -> bool {
        let listener: Arc<dyn BatteryLevelListener> = listener.clone();
        let r = self.listeners.unregister(&listener);
        if r && self.listeners.is_empty() {
            self.set_notification(false);
        }
        r
    }

    fn set_notification(&self, enable: bool) {
        let characteristic = match &self.characteristic {
            Some(v) => v,
            None => return,
        };
        let device = match self.device.upgrade() {
            Some(v) => v,
            None => return,
        };
        if enable {
            if let Err(e) = device.add_characteristic_listener(characteristic, &self.subscription) {
                warn!("couldn't subscribe to battery level: {}", e);
            }
        } else {
            device.remove_characteristic_listener(characteristic, &self.subscription);
        }
    }

    fn update(&self, characteristic: Uuid, value: &[u8]) {
        if characteristic != BATTERY_LEVEL {
            return;
        }
        let new = match value.first() {
            Some(&v) => BatteryLevel::Percent(v),
            None => {
                warn!("empty battery level value");
                return;
            }
        };
        let mut level = lock(&self.level);
        debug!("battery level {} (was {})", new, *level);
        if *level != new {
            *level = new;
            self.listeners.dispatch(move |l| l.on_battery_level_changed(new));
        }
    }
}

impl ServiceHandler for BatteryService {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn on_characteristic_read(&self, characteristic: Uuid, value: &[u8]) {
        self.update(characteristic, value);
    }

    fn on_characteristic_changed(&self, characteristic: Uuid, value: &[u8]) {
        self.update(characteristic, value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    use crate::bus::DispatchQueue;
    use crate::gatt::{CharacteristicDescriptor, Property, ServiceId};
    use crate::sync;

    fn context() -> ServiceContext {
        ServiceContext {
            device: WeakDevice::new(),
            queue: DispatchQueue::new("test-battery").unwrap(),
        }
    }

    fn descriptor(with_level: bool) -> ServiceDescriptor {
        let d = ServiceDescriptor::new(ServiceId::new(BATTERY_SERVICE, 1));
        if with_level {
            d.with_characteristic(CharacteristicDescriptor::new(BATTERY_LEVEL, Property::Read | Property::Notify))
        } else {
            d
        }
    }

    #[test]
    fn unavailable_without_level_characteristic() {
        let s = BatteryService::new(&context(), &descriptor(false));
        assert_eq!(s.level(), BatteryLevel::Unavailable);
    }

    #[test]
    fn dispatches_only_changes() {
        let s = BatteryService::new(&context(), &descriptor(true));
        assert_eq!(s.level(), BatteryLevel::Unknown);

        let (tx, rx) = sync::channel();
        let tx = Mutex::new(tx);
        let listener = Arc::new(move |level: BatteryLevel| { let _ = lock(&tx).send(level); });
        assert!(s.add_battery_level_listener(&listener));
        assert!(!s.add_battery_level_listener(&listener));

        s.on_characteristic_changed(BATTERY_LEVEL, &[0x32]);
        s.on_characteristic_read(BATTERY_LEVEL, &[0x32]);
        s.on_characteristic_read(BATTERY_LEVEL, &[0x31]);
        s.on_characteristic_changed(Uuid::from_u16(0x2a00), &[0x10]);
        s.on_characteristic_changed(BATTERY_LEVEL, &[]);

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), BatteryLevel::Percent(50));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), BatteryLevel::Percent(49));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(s.level(), BatteryLevel::Percent(49));

        assert!(s.remove_battery_level_listener(&listener));
        assert!(!s.remove_battery_level_listener(&listener));
    }

    #[test]
    fn display() {
        assert_eq!(BatteryLevel::Percent(50).to_string(), "50%");
        assert_eq!(BatteryLevel::Unknown.to_string(), "unknown");
    }
}
