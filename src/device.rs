//! The per-device connection state machine and its public handle.

mod executor;
mod watchdog;

use log::*;
use static_assertions::assert_impl_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI16, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bus::{DispatchQueue, EventBus};
use crate::error::{Error, ErrorKind, GattStatus};
use crate::event::*;
use crate::gatt::descriptor::{DISABLE_NOTIFICATION_VALUE, ENABLE_INDICATION_VALUE,
    ENABLE_NOTIFICATION_VALUE};
use crate::gatt::{AttributeId, CharacteristicDescriptor, CharacteristicId, DefaultServiceFactory,
    DescriptorId, Service, ServiceContext, ServiceDescriptor, ServiceFactory, ServiceRegistry};
use crate::sync::lock;
use crate::transport::{EventSink, Session, Transport, TransportEvent};
use crate::util::HexBytes;
use crate::uuid::Uuid;
use crate::{Address, ConnectionState};
use executor::{ExecutorHandle, Operation, OperationKind};
use watchdog::Watchdog;

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(15);

/// Signal strength reported before any reading is available.
pub const UNKNOWN_RSSI: i16 = -127;

#[derive(Clone, Debug)]
struct Config {
    operation_timeout: Duration,
    watchdog_timeout: Duration,
}

struct Link {
    state: ConnectionState,
    auto_connect: bool,
    session: Option<Arc<dyn Session>>,
}

pub(crate) struct Buses {
    pub connection_state: EventBus<dyn ConnectionStateListener>,
    pub service_discovered: EventBus<dyn ServiceDiscoveredListener>,
    pub error: EventBus<dyn ErrorListener>,
    pub long_time_no_see: EventBus<dyn LongTimeNoSeeListener>,
}

impl Buses {
    fn new(queue: &DispatchQueue) -> Self {
        Self {
            connection_state: EventBus::new(queue.clone()),
            service_discovered: EventBus::new(queue.clone()),
            error: EventBus::new(queue.clone()),
            long_time_no_see: EventBus::new(queue.clone()),
        }
    }
}

/// State reachable from the worker threads and the transport.
///
/// Lock order: `link`, then `subscriptions`, then `registry`. The registry lock is never held
/// while taking another one.
pub(crate) struct Shared {
    this: Weak<Inner>,
    address: Address,
    name: Option<String>,
    config: Config,
    transport: Arc<dyn Transport>,
    factory: Arc<dyn ServiceFactory>,
    queue: DispatchQueue,
    link: Mutex<Link>,
    rssi: AtomicI16,
    registry: Mutex<ServiceRegistry>,
    subscriptions: Mutex<HashMap<CharacteristicId, EventBus<dyn CharacteristicListener>>>,
    buses: Buses,
    executor: ExecutorHandle,
    watchdog: Watchdog,
}

impl Shared {
    fn session(&self) -> Option<Arc<dyn Session>> {
        lock(&self.link).session.clone()
    }

    fn emit_state(&self, state: ConnectionState) {
        debug!("{}: {}", self.address, state);
        self.buses.connection_state.dispatch(move |l| l.on_connection_state_changed(state));
    }

    fn emit_error(&self, event: ErrorEvent) {
        self.buses.error.dispatch(move |l| l.on_error(&event));
    }

    fn emit_status(&self, status: GattStatus, what: impl fmt::Display) {
        let error = Error::from_status(status, format_args!("{}: {}", self.address, what));
        error!("{}", error);
        self.emit_error(ErrorEvent::Gatt { status, error });
    }

    /// Forgets everything learned during the current connection.
    fn invalidate_services(&self) {
        lock(&self.registry).clear();
        let mut subscriptions = lock(&self.subscriptions);
        if !subscriptions.is_empty() {
            debug!("{}: dropping {} subscription(s)", self.address, subscriptions.len());
            subscriptions.clear();
        }
    }

    /// Moves to `Disconnected`. The returned session must be closed once `link` is released.
    fn tear_down(&self, link: &mut Link) -> Option<Arc<dyn Session>> {
        link.state = ConnectionState::Disconnected;
        self.invalidate_services();
        self.watchdog.arm();
        self.emit_state(ConnectionState::Disconnected);
        info!("disconnected from {}", self.address);
        link.session.take()
    }

    fn characteristic(&self, id: &CharacteristicId)
        -> Result<(Arc<Service>, CharacteristicDescriptor), Error>
    {
        let service = lock(&self.registry).find(id.service())
            .ok_or_else(|| Error::new(ErrorKind::UnknownService,
                format!("service {} is not registered", id.service())))?;
        let characteristic = service.characteristic(id.uuid()).cloned()
            .ok_or_else(|| Error::new(ErrorKind::UnknownCharacteristic,
                format!("service {} has no characteristic {:?}", id.service(), id.uuid())))?;
        Ok((service, characteristic))
    }

    fn check_connected(&self, link: &Link) -> Result<(), Error> {
        if link.state == ConnectionState::Connected {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::NotConnected,
                format!("{} is {}", self.address, link.state)))
        }
    }

    fn submit(&self, kind: OperationKind) -> Result<(), Error> {
        let link = lock(&self.link);
        self.submit_locked(&link, kind)
    }

    fn submit_locked(&self, link: &Link, kind: OperationKind) -> Result<(), Error> {
        self.check_connected(link)?;
        let service = match kind.target() {
            AttributeId::Characteristic(c) => self.characteristic(&c)?.0,
            AttributeId::Descriptor(d) => {
                let (service, characteristic) = self.characteristic(&d.characteristic())?;
                let cccd = matches!(kind, OperationKind::SetNotification(..));
                if !cccd && !characteristic.has_descriptor(d.uuid()) {
                    return Err(Error::new(ErrorKind::UnknownDescriptor,
                        format!("{} has no descriptor {:?}", d.characteristic(), d.uuid())));
                }
                service
            }
        };
        trace!("queueing {:?}", kind);
        self.executor.submit(Operation { service, kind })
    }

    fn notification_kind(&self, id: &CharacteristicId, enable: bool) -> Result<OperationKind, Error> {
        let value = if enable {
            let properties = self.characteristic(id)?.1.properties;
            if properties.is_notify() {
                ENABLE_NOTIFICATION_VALUE
            } else if properties.is_indicate() {
                ENABLE_INDICATION_VALUE
            } else {
                return Err(Error::new(ErrorKind::OperationNotSupported,
                    format!("{} supports neither notifications nor indications", id)));
            }
        } else {
            DISABLE_NOTIFICATION_VALUE
        };
        Ok(OperationKind::SetNotification(*id, value))
    }

    pub(crate) fn handle_transport_event(&self, event: TransportEvent) {
        use TransportEvent::*;
        match event {
            ConnectionStateChanged { status, new_state } => self.on_connection_state_changed(status, new_state),
            ServicesDiscovered { status, services } => self.on_services_discovered(status, services),
            CharacteristicRead { request, characteristic, status, value }
            | CharacteristicWrite { request, characteristic, status, value } => {
                self.executor.complete(request, characteristic.into(), status, value);
            }
            DescriptorRead { request, descriptor, status, value }
            | DescriptorWrite { request, descriptor, status, value } => {
                self.executor.complete(request, descriptor.into(), status, value);
            }
            CharacteristicChanged { characteristic, value } => self.on_characteristic_changed(characteristic, value),
            RssiRead { status, rssi } => {
                if status.is_success() {
                    trace!("{}: rssi {}", self.address, rssi);
                    self.rssi.store(rssi, Ordering::Relaxed);
                } else {
                    self.emit_status(status, "reading rssi");
                }
            }
        }
    }

    fn on_connection_state_changed(&self, status: GattStatus, new_state: ConnectionState) {
        let mut link = lock(&self.link);

        if !status.is_success() {
            self.emit_status(status, format_args!("transition to {}", new_state));
            if new_state == ConnectionState::Disconnected && link.state != ConnectionState::Disconnected {
                let session = self.tear_down(&mut link);
                drop(link);
                if let Some(session) = session {
                    session.close();
                }
            }
            return;
        }

        debug!("{}: transport reports {} while {}", self.address, new_state, link.state);
        match new_state {
            ConnectionState::Connected => {
                if link.state != ConnectionState::Connecting {
                    warn!("{}: ignoring link-up while {}", self.address, link.state);
                    return;
                }
                link.state = ConnectionState::Connected;
                self.watchdog.cancel();
                self.emit_state(ConnectionState::Connected);
                info!("connected to {}", self.address);
                let session = link.session.clone();
                drop(link);
                // The result may be delivered before this returns.
                if let Some(session) = session {
                    if let Err(e) = session.discover_services() {
                        self.emit_status(GattStatus::FAILURE,
                            format_args!("couldn't start service discovery: {}", e));
                    }
                }
            }
            ConnectionState::Disconnected => {
                if link.state == ConnectionState::Disconnected {
                    debug!("{}: already disconnected", self.address);
                } else if link.auto_connect && link.state != ConnectionState::Disconnecting {
                    info!("lost link to {}, waiting for the transport to reconnect", self.address);
                    self.invalidate_services();
                    link.state = ConnectionState::Connecting;
                    self.emit_state(ConnectionState::Connecting);
                } else {
                    let session = self.tear_down(&mut link);
                    drop(link);
                    if let Some(session) = session {
                        session.close();
                    }
                }
            }
            ConnectionState::Connecting | ConnectionState::Disconnecting => {
                if link.state == ConnectionState::Disconnected {
                    warn!("{}: ignoring {} while disconnected", self.address, new_state);
                } else if link.state != new_state {
                    link.state = new_state;
                    self.emit_state(new_state);
                }
            }
        }
    }

    fn on_services_discovered(&self, status: GattStatus, services: Vec<ServiceDescriptor>) {
        if !status.is_success() {
            self.emit_status(status, "service discovery");
            return;
        }

        let link = lock(&self.link);
        if link.state != ConnectionState::Connected {
            warn!("{}: ignoring discovered services while {}", self.address, link.state);
            return;
        }

        let context = ServiceContext {
            device: WeakDevice(self.this.clone()),
            queue: self.queue.clone(),
        };
        let services: Vec<_> = services.into_iter()
            .map(|descriptor| {
                let handler = self.factory.create(&context, &descriptor);
                Arc::new(Service::new(descriptor, handler))
            })
            .collect();
        lock(&self.registry).replace(services.clone());
        drop(link);

        for service in services {
            debug!("{}: discovered {:?}", self.address, service);
            self.buses.service_discovered.dispatch(move |l| l.on_service_discovered(&service));
        }
    }

    fn on_characteristic_changed(&self, characteristic: CharacteristicId, value: Vec<u8>) {
        let service = lock(&self.registry).route(characteristic.service(), "characteristic changed");
        let service = match service {
            Some(v) => v,
            None => return,
        };
        debug!("{} changed: {}", characteristic, HexBytes(&value));
        if let Some(handler) = service.handler() {
            handler.on_characteristic_changed(characteristic.uuid(), &value);
        }
        let bus = lock(&self.subscriptions).get(&characteristic).cloned();
        if let Some(bus) = bus {
            let uuid = characteristic.uuid();
            bus.dispatch(move |l| l.on_characteristic_changed(&service, uuid, &value));
        }
    }

    /// Stops the background threads and releases the session.
    fn shutdown(&self) {
        self.executor.stop();
        self.watchdog.stop();
        let session = lock(&self.link).session.take();
        if let Some(session) = session {
            session.close();
        }
    }
}

struct Inner {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        trace!("dropping device {}", self.shared.address);
        self.shared.shutdown();
        let current = thread::current().id();
        for handle in lock(&self.threads).drain(..) {
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

/// Configures and creates a [`Device`].
pub struct DeviceBuilder {
    address: Address,
    transport: Arc<dyn Transport>,
    name: Option<String>,
    operation_timeout: Duration,
    watchdog_timeout: Duration,
    queue: Option<DispatchQueue>,
    factory: Option<Arc<dyn ServiceFactory>>,
}

impl DeviceBuilder {
    pub fn new(address: Address, transport: Arc<dyn Transport>) -> Self {
        Self {
            address,
            transport,
            name: None,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            watchdog_timeout: DEFAULT_WATCHDOG_TIMEOUT,
            queue: None,
            factory: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// How long a GATT operation may stay in flight before it's abandoned.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// How long the device may stay unreachable before "long time no see" is reported.
    pub fn watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    /// Delivers listener callbacks on `queue` instead of a dedicated one.
    pub fn callback_queue(mut self, queue: DispatchQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn service_factory(mut self, factory: Arc<dyn ServiceFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<Device, Error> {
        let address = self.address;
        if self.operation_timeout.is_zero() || self.watchdog_timeout.is_zero() {
            return Err(Error::new(ErrorKind::InvalidParameters,
                format!("{}: timeouts must be non-zero", address)));
        }
        let queue = match self.queue {
            Some(v) => v,
            None => DispatchQueue::new(&format!("gatt-callbacks-{}", address))?,
        };
        let buses = Buses::new(&queue);
        let long_time_no_see = buses.long_time_no_see.clone();
        let (executor, executor_rx) = ExecutorHandle::new();
        let (watchdog, watchdog_rx) = Watchdog::new();
        let config = Config {
            operation_timeout: self.operation_timeout,
            watchdog_timeout: self.watchdog_timeout,
        };
        let factory = self.factory
            .unwrap_or_else(|| Arc::new(DefaultServiceFactory) as Arc<dyn ServiceFactory>);
        let name = self.name;
        let transport = self.transport;

        let inner = Arc::new_cyclic(|this| Inner {
            shared: Arc::new(Shared {
                this: this.clone(),
                address,
                name,
                config,
                transport,
                factory,
                queue,
                link: Mutex::new(Link {
                    state: ConnectionState::Disconnected,
                    auto_connect: false,
                    session: None,
                }),
                rssi: AtomicI16::new(UNKNOWN_RSSI),
                registry: Mutex::new(ServiceRegistry::new()),
                subscriptions: Mutex::new(HashMap::new()),
                buses,
                executor,
                watchdog,
            }),
            threads: Mutex::new(Vec::new()),
        });
        let device = Device(inner);

        let worker = executor::spawn(executor_rx, device.0.shared.clone())?;
        lock(&device.0.threads).push(worker);

        let timer = watchdog::spawn(watchdog_rx, format!("gatt-watchdog-{}", address),
            device.0.shared.config.watchdog_timeout,
            move || {
                info!("{} has been unreachable for too long", address);
                long_time_no_see.dispatch(move |l| l.on_long_time_no_see(address));
            })?;
        lock(&device.0.threads).push(timer);

        debug!("created device {}", address);
        Ok(device)
    }
}

/// Handle to one remote peripheral. Clones share the same device.
///
/// Dropping the last handle stops the device's threads and closes its session.
#[derive(Clone)]
pub struct Device(Arc<Inner>);

assert_impl_all!(Device: Send, Sync);

impl Device {
    /// Creates a device with default configuration.
    pub fn new(address: Address, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        DeviceBuilder::new(address, transport).build()
    }

    pub fn builder(address: Address, transport: Arc<dyn Transport>) -> DeviceBuilder {
        DeviceBuilder::new(address, transport)
    }

    fn shared(&self) -> &Arc<Shared> {
        &self.0.shared
    }

    pub fn address(&self) -> Address {
        self.shared().address
    }

    pub fn name(&self) -> Option<&str> {
        self.shared().name.as_deref()
    }

    /// Last known signal strength in dBm, [`UNKNOWN_RSSI`] until reported.
    pub fn rssi(&self) -> i16 {
        self.shared().rssi.load(Ordering::Relaxed)
    }

    pub fn update_rssi(&self, rssi: i16) {
        self.shared().rssi.store(rssi, Ordering::Relaxed);
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.shared().link).state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// The queue all listener callbacks of this device run on.
    pub fn callback_queue(&self) -> &DispatchQueue {
        &self.shared().queue
    }

    pub fn downgrade(&self) -> WeakDevice {
        WeakDevice(Arc::downgrade(&self.0))
    }

    /// Starts connecting. Only valid while disconnected.
    ///
    /// With `auto_connect` the transport retries on its own after link loss and the device
    /// stays `Connecting` until the transport gives up. There's no retry limit here: a transport
    /// that never gives up keeps the session open until [`disconnect`](Self::disconnect).
    pub fn connect(&self, auto_connect: bool) -> Result<(), Error> {
        let shared = self.shared();
        let mut link = lock(&shared.link);
        if link.state != ConnectionState::Disconnected {
            return Err(Error::new(ErrorKind::AlreadyConnected,
                format!("{} is {}", shared.address, link.state)));
        }

        info!("connecting to {} (auto connect: {})", shared.address, auto_connect);
        let sink = EventSink::new(Arc::downgrade(shared));
        let session = shared.transport.open(shared.address, auto_connect, sink)
            .map_err(|e| Error::new(ErrorKind::ConnectionFailed,
                format!("couldn't open link to {}: {}", shared.address, e)))?;

        shared.watchdog.cancel();
        link.session = Some(session);
        link.auto_connect = auto_connect;
        link.state = ConnectionState::Connecting;
        shared.emit_state(ConnectionState::Connecting);
        Ok(())
    }

    /// Requests link teardown. Returns `false` if already disconnected or disconnecting.
    ///
    /// Operations already issued are not cancelled; they complete, fail or time out.
    pub fn disconnect(&self) -> bool {
        let shared = self.shared();
        let mut link = lock(&shared.link);
        let state = link.state;
        match state {
            ConnectionState::Disconnected | ConnectionState::Disconnecting => {
                debug!("{}: disconnect while {}", shared.address, state);
                false
            }
            ConnectionState::Connecting | ConnectionState::Connected => {
                info!("disconnecting from {}", shared.address);
                link.state = ConnectionState::Disconnecting;
                shared.emit_state(ConnectionState::Disconnecting);
                shared.watchdog.arm();
                let session = link.session.clone();
                drop(link);
                if let Some(session) = session {
                    session.disconnect();
                }
                true
            }
        }
    }

    /// Tells the device someone still cares about it: while connected this cancels the
    /// "long time no see" timer, otherwise it restarts it.
    pub fn signal_activity(&self) {
        let shared = self.shared();
        let link = lock(&shared.link);
        if link.state == ConnectionState::Connected {
            shared.watchdog.cancel();
        } else {
            shared.watchdog.arm();
        }
    }

    /// First discovered service of the given type.
    pub fn service(&self, uuid: Uuid) -> Option<Arc<Service>> {
        lock(&self.shared().registry).get(uuid)
    }

    pub fn services_with_uuid(&self, uuid: Uuid) -> Vec<Arc<Service>> {
        lock(&self.shared().registry).get_all(uuid)
    }

    pub fn services(&self) -> Vec<Arc<Service>> {
        lock(&self.shared().registry).all()
    }

    /// Queues a read. The value is routed to the service's handler.
    pub fn read_characteristic(&self, characteristic: &CharacteristicId) -> Result<(), Error> {
        self.shared().submit(OperationKind::ReadCharacteristic(*characteristic))
    }

    pub fn write_characteristic(&self, characteristic: &CharacteristicId, value: &[u8]) -> Result<(), Error> {
        self.shared().submit(OperationKind::WriteCharacteristic(*characteristic, value.to_vec()))
    }

    pub fn read_descriptor(&self, descriptor: &DescriptorId) -> Result<(), Error> {
        self.shared().submit(OperationKind::ReadDescriptor(*descriptor))
    }

    pub fn write_descriptor(&self, descriptor: &DescriptorId, value: &[u8]) -> Result<(), Error> {
        self.shared().submit(OperationKind::WriteDescriptor(*descriptor, value.to_vec()))
    }

    /// Queues a write of the client characteristic configuration descriptor. Enabling uses
    /// notifications if the characteristic supports them and indications otherwise.
    pub fn set_characteristic_notification(&self, characteristic: &CharacteristicId, enable: bool)
        -> Result<(), Error>
    {
        let shared = self.shared();
        let link = lock(&shared.link);
        shared.check_connected(&link)?;
        let kind = shared.notification_kind(characteristic, enable)?;
        shared.submit_locked(&link, kind)
    }

    /// Subscribes to value changes of a characteristic. Notifications are enabled on the
    /// peripheral when the first listener for it is added.
    ///
    /// Returns `Ok(false)` if the listener is already registered. Subscriptions last for the
    /// current connection only.
    pub fn add_characteristic_listener<L>(&self, characteristic: &CharacteristicId, listener: &Arc<L>)
        -> Result<bool, Error>
        where L: CharacteristicListener + 'static
    {
        let shared = self.shared();
        let listener: Arc<dyn CharacteristicListener> = listener.clone();

        let link = lock(&shared.link);
        shared.check_connected(&link)?;
        let kind = shared.notification_kind(characteristic, true)?;

        let mut subscriptions = lock(&shared.subscriptions);
        let bus = subscriptions.entry(*characteristic)
            .or_insert_with(|| EventBus::new(shared.queue.clone()))
            .clone();
        let first = bus.is_empty();
        if !bus.register(&listener) {
            return Ok(false);
        }
        if first {
            if let Err(e) = shared.submit_locked(&link, kind) {
                bus.unregister(&listener);
                if bus.is_empty() {
                    subscriptions.remove(characteristic);
                }
                return Err(e);
            }
        }
        Ok(true)
    }

    /// Returns whether the listener was registered. Notifications are disabled on the
    /// peripheral when the last listener is removed.
    pub fn remove_characteristic_listener<L>(&self, characteristic: &CharacteristicId, listener: &Arc<L>)
        -> bool
        where L: CharacteristicListener + 'static
    {
        let shared = self.shared();
        let listener: Arc<dyn CharacteristicListener> = listener.clone();

        let link = lock(&shared.link);
        let mut subscriptions = lock(&shared.subscriptions);
        let bus = match subscriptions.get(characteristic) {
            Some(v) => v.clone(),
            None => return false,
        };
        if !bus.unregister(&listener) {
            return false;
        }
        if bus.is_empty() {
            subscriptions.remove(characteristic);
            if link.state == ConnectionState::Connected {
                let kind = OperationKind::SetNotification(*characteristic, DISABLE_NOTIFICATION_VALUE);
                if let Err(e) = shared.submit_locked(&link, kind) {
                    warn!("couldn't disable notifications on {}: {}", characteristic, e);
                }
            }
        }
        true
    }
}

listener_methods! {
    /// Adds a listener for connection state changes.
    connection_state: ConnectionStateListener => add_connection_state_listener, remove_connection_state_listener;

    /// Adds a listener called once per discovered service.
    service_discovered: ServiceDiscoveredListener => add_service_discovered_listener, remove_service_discovered_listener;

    /// Adds a listener for asynchronous failures.
    error: ErrorListener => add_error_listener, remove_error_listener;

    /// Adds a listener called when the device stayed unreachable for the watchdog period.
    long_time_no_see: LongTimeNoSeeListener => add_long_time_no_see_listener, remove_long_time_no_see_listener;
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.address())
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

/// Non-owning [`Device`] handle, for objects the device itself keeps alive.
#[derive(Clone, Default)]
pub struct WeakDevice(Weak<Inner>);

assert_impl_all!(WeakDevice: Send, Sync);

impl WeakDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrade(&self) -> Option<Device> {
        self.0.upgrade().map(Device)
    }
}

impl fmt::Debug for WeakDevice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("WeakDevice")
    }
}
