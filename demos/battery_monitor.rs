use anyhow::{anyhow, Result};
use chrono::Local;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use gatt_link::gatt::battery::{BatteryLevel, BatteryService, BATTERY_LEVEL, BATTERY_SERVICE};
use gatt_link::gatt::descriptor::CLIENT_CHARACTERISTIC_CONFIGURATION;
use gatt_link::gatt::{CharacteristicDescriptor, CharacteristicId, DescriptorId, Property,
    ServiceDescriptor, ServiceId};
use gatt_link::*;

fn later(sink: &EventSink, delay: Duration, event: TransportEvent) {
    let sink = sink.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        sink.send(event);
    });
}

/// Peripheral whose battery drains by one percent every half second.
struct Simulator {
    level: Arc<Mutex<u8>>,
}

impl Transport for Simulator {
    fn open(&self, address: Address, _auto_connect: bool, sink: EventSink)
        -> Result<Arc<dyn Session>, gatt_link::Error>
    {
        info!("simulating {}", address);
        later(&sink, Duration::from_millis(200), TransportEvent::ConnectionStateChanged {
            status: GattStatus::SUCCESS,
            new_state: ConnectionState::Connected,
        });

        let session = Arc::new(SimSession {
            sink,
            level: self.level.clone(),
            notifying: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        });
        session.start_draining();
        Ok(session)
    }
}

struct SimSession {
    sink: EventSink,
    level: Arc<Mutex<u8>>,
    notifying: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl SimSession {
    fn service_id() -> ServiceId {
        ServiceId::new(BATTERY_SERVICE, 0x0010)
    }

    fn start_draining(&self) {
        let sink = self.sink.clone();
        let level = self.level.clone();
        let notifying = self.notifying.clone();
        let closed = self.closed.clone();
        thread::spawn(move || {
            while !closed.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(500));
                let value = {
                    let mut level = level.lock().unwrap();
                    *level = level.saturating_sub(1);
                    *level
                };
                if notifying.load(Ordering::SeqCst) {
                    sink.send(TransportEvent::CharacteristicChanged {
                        characteristic: Self::service_id().characteristic(BATTERY_LEVEL),
                        value: vec![value],
                    });
                }
            }
        });
    }

    fn respond(&self, event: TransportEvent) {
        later(&self.sink, Duration::from_millis(20), event);
    }
}

impl Session for SimSession {
    fn discover_services(&self) -> Result<(), gatt_link::Error> {
        let battery = ServiceDescriptor::new(Self::service_id())
            .with_characteristic(CharacteristicDescriptor::new(BATTERY_LEVEL, Property::Read | Property::Notify)
                .with_descriptor(CLIENT_CHARACTERISTIC_CONFIGURATION));
        let info = ServiceDescriptor::new(ServiceId::new(Uuid::from_u16(0x180a), 0x0020))
            .with_characteristic(CharacteristicDescriptor::new(Uuid::from_u16(0x2a29), Property::Read));
        self.respond(TransportEvent::ServicesDiscovered {
            status: GattStatus::SUCCESS,
            services: vec![battery, info],
        });
        Ok(())
    }

    fn read_characteristic(&self, request: RequestId, characteristic: &CharacteristicId)
        -> Result<(), gatt_link::Error>
    {
        let value = if characteristic.uuid() == BATTERY_LEVEL {
            vec![*self.level.lock().unwrap()]
        } else {
            b"Simulated Inc.".to_vec()
        };
        self.respond(TransportEvent::CharacteristicRead {
            request,
            characteristic: *characteristic,
            status: GattStatus::SUCCESS,
            value,
        });
        Ok(())
    }

    fn write_characteristic(&self, request: RequestId, characteristic: &CharacteristicId, _value: &[u8])
        -> Result<(), gatt_link::Error>
    {
        // Nothing here is writable.
        self.respond(TransportEvent::CharacteristicWrite {
            request,
            characteristic: *characteristic,
            status: GattStatus::new(0x03),
            value: Vec::new(),
        });
        Ok(())
    }

    fn read_descriptor(&self, request: RequestId, descriptor: &DescriptorId) -> Result<(), gatt_link::Error> {
        let value = if self.notifying.load(Ordering::SeqCst) { vec![1, 0] } else { vec![0, 0] };
        self.respond(TransportEvent::DescriptorRead {
            request,
            descriptor: *descriptor,
            status: GattStatus::SUCCESS,
            value,
        });
        Ok(())
    }

    fn write_descriptor(&self, request: RequestId, descriptor: &DescriptorId, value: &[u8])
        -> Result<(), gatt_link::Error>
    {
        self.respond(TransportEvent::DescriptorWrite {
            request,
            descriptor: *descriptor,
            status: GattStatus::SUCCESS,
            value: value.to_vec(),
        });
        Ok(())
    }

    fn set_notification(&self, _characteristic: &CharacteristicId, enable: bool) -> Result<(), gatt_link::Error> {
        self.notifying.store(enable, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.respond(TransportEvent::ConnectionStateChanged {
            status: GattStatus::SUCCESS,
            new_state: ConnectionState::Disconnected,
        });
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn now() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

pub fn main() -> Result<()> {
    env_logger::init();

    let transport = Arc::new(Simulator { level: Arc::new(Mutex::new(87)) });
    let device = Device::builder("AA:BB:CC:DD:EE:FF".parse()?, transport)
        .name("Simulated sensor")
        .watchdog_timeout(Duration::from_secs(2))
        .build()?;

    let on_state = Arc::new(|state: ConnectionState| println!("{} state: {}", now(), state));
    device.add_connection_state_listener(&on_state);

    let on_error = Arc::new(|e: &ErrorEvent| println!("{} error: {:?}", now(), e));
    device.add_error_listener(&on_error);

    let (discovered_tx, discovered) = mpsc::channel();
    let discovered_tx = Mutex::new(discovered_tx);
    let on_service = Arc::new(move |service: &Arc<Service>| {
        println!("{} discovered {:?}", now(), service.uuid());
        let _ = discovered_tx.lock().unwrap().send(service.clone());
    });
    device.add_service_discovered_listener(&on_service);

    let (gone_tx, gone) = mpsc::channel();
    let gone_tx = Mutex::new(gone_tx);
    let on_gone = Arc::new(move |address: Address| {
        println!("{} long time no see {}", now(), address);
        let _ = gone_tx.lock().unwrap().send(());
    });
    device.add_long_time_no_see_listener(&on_gone);

    println!("connecting to {:?}", device.name());
    device.connect(false)?;

    let service = loop {
        let service = discovered.recv_timeout(Duration::from_secs(5))?;
        if service.uuid() == BATTERY_SERVICE {
            break service;
        }
    };
    let battery = service.handler_as::<BatteryService>()
        .ok_or_else(|| anyhow!("battery service has no handler"))?;

    let on_level = Arc::new(|level: BatteryLevel| println!("{} battery: {}", now(), level));
    battery.add_battery_level_listener(&on_level);

    let on_raw = Arc::new(|_: &Arc<Service>, characteristic: Uuid, value: &[u8]| {
        println!("{} {:?} = {}", now(), characteristic, hex::encode(value));
    });
    if let Some(id) = service.characteristic_id(BATTERY_LEVEL) {
        device.add_characteristic_listener(&id, &on_raw)?;
    }

    println!("battery level right now: {}", battery.level());
    thread::sleep(Duration::from_secs(3));
    println!("battery level after a while: {}", battery.level());

    device.disconnect();
    gone.recv_timeout(Duration::from_secs(5))?;
    Ok(())
}
