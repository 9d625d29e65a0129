//! Scriptable transport for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::{Error, ErrorKind, GattStatus};
use crate::gatt::{AttributeId, CharacteristicId, DescriptorId, ServiceDescriptor};
use crate::sync::{self, lock, Receiver, SharedSender};
use crate::transport::{EventSink, RequestId, Session, Transport, TransportEvent};
use crate::{Address, ConnectionState};

/// Request seen by the mock, in issue order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    Open { address: Address, auto_connect: bool },
    DiscoverServices,
    ReadCharacteristic(CharacteristicId),
    WriteCharacteristic(CharacteristicId, Vec<u8>),
    ReadDescriptor(DescriptorId),
    WriteDescriptor(DescriptorId, Vec<u8>),
    SetNotification(CharacteristicId, bool),
    Disconnect,
    Close,
}

struct State {
    calls: SharedSender<Call>,
    sink: Mutex<Option<EventSink>>,
    fail_open: AtomicBool,
    fail_next: AtomicBool,
    auto_respond: AtomicBool,
    inline: AtomicBool,
    services: Mutex<Option<Vec<ServiceDescriptor>>>,
    last_request: Mutex<Option<RequestId>>,
    values: Mutex<HashMap<AttributeId, Vec<u8>>>,
}

impl State {
    fn record(&self, call: Call) -> Result<(), Error> {
        self.calls.send(call);
        self.fail()
    }

    fn record_request(&self, request: RequestId, call: Call) -> Result<(), Error> {
        *lock(&self.last_request) = Some(request);
        self.calls.send(call);
        self.fail()
    }

    fn fail(&self) -> Result<(), Error> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(Error::new(ErrorKind::Other, "mock transport refused the request"))
        } else {
            Ok(())
        }
    }

    /// Delivers from another thread, as a radio stack would, or right away in inline mode.
    fn respond_later(&self, event: TransportEvent) {
        if !self.auto_respond.load(Ordering::SeqCst) {
            return;
        }
        let sink = match lock(&self.sink).clone() {
            Some(v) => v,
            None => return,
        };
        if self.inline.load(Ordering::SeqCst) {
            sink.send(event);
        } else {
            thread::spawn(move || sink.send(event));
        }
    }

    fn read(&self, target: AttributeId) -> Vec<u8> {
        lock(&self.values).get(&target).cloned().unwrap_or_default()
    }

    fn store(&self, target: AttributeId, value: &[u8]) {
        lock(&self.values).insert(target, value.to_vec());
    }
}

pub struct MockTransport {
    state: Arc<State>,
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, Receiver<Call>) {
        let (tx, rx) = sync::channel();
        (Arc::new(Self {
            state: Arc::new(State {
                calls: SharedSender::new(tx),
                sink: Mutex::new(None),
                fail_open: AtomicBool::new(false),
                fail_next: AtomicBool::new(false),
                auto_respond: AtomicBool::new(false),
                inline: AtomicBool::new(false),
                services: Mutex::new(None),
                last_request: Mutex::new(None),
                values: Mutex::new(HashMap::new()),
            }),
        }), rx)
    }

    pub fn fail_open(&self, v: bool) {
        self.state.fail_open.store(v, Ordering::SeqCst);
    }

    /// Makes the next session request return `Err`.
    pub fn fail_next_request(&self) {
        self.state.fail_next.store(true, Ordering::SeqCst);
    }

    /// Completes reads and writes on its own, answering reads with the last written value,
    /// and confirms disconnects.
    pub fn auto_respond(&self, v: bool) {
        self.state.auto_respond.store(v, Ordering::SeqCst);
    }

    /// Responds on the thread that issued the request, before the request returns.
    /// Only has an effect together with [`auto_respond`](Self::auto_respond).
    pub fn respond_inline(&self, v: bool) {
        self.state.inline.store(v, Ordering::SeqCst);
    }

    /// Services reported when auto responding to discovery.
    pub fn serve(&self, services: Vec<ServiceDescriptor>) {
        *lock(&self.state.services) = Some(services);
    }

    /// Tag of the most recently issued read or write.
    pub fn last_request(&self) -> RequestId {
        (*lock(&self.state.last_request)).unwrap_or_else(|| RequestId::new(0))
    }

    /// Injects an event synchronously on the calling thread.
    pub fn send(&self, event: TransportEvent) {
        let sink = lock(&self.state.sink).clone();
        if let Some(sink) = sink {
            sink.send(event);
        }
    }
}

impl Transport for MockTransport {
    fn open(&self, address: Address, auto_connect: bool, sink: EventSink)
        -> Result<Arc<dyn Session>, Error>
    {
        self.state.calls.send(Call::Open { address, auto_connect });
        if self.state.fail_open.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::Other, "mock transport is off"));
        }
        *lock(&self.state.sink) = Some(sink);
        Ok(Arc::new(MockSession { state: self.state.clone() }))
    }
}

struct MockSession {
    state: Arc<State>,
}

impl Session for MockSession {
    fn discover_services(&self) -> Result<(), Error> {
        self.state.record(Call::DiscoverServices)?;
        if let Some(services) = lock(&self.state.services).clone() {
            self.state.respond_later(TransportEvent::ServicesDiscovered {
                status: GattStatus::SUCCESS,
                services,
            });
        }
        Ok(())
    }

    fn read_characteristic(&self, request: RequestId, characteristic: &CharacteristicId) -> Result<(), Error> {
        self.state.record_request(request, Call::ReadCharacteristic(*characteristic))?;
        self.state.respond_later(TransportEvent::CharacteristicRead {
            request,
            characteristic: *characteristic,
            status: GattStatus::SUCCESS,
            value: self.state.read((*characteristic).into()),
        });
        Ok(())
    }

    fn write_characteristic(&self, request: RequestId, characteristic: &CharacteristicId, value: &[u8])
        -> Result<(), Error>
    {
        self.state.record_request(request, Call::WriteCharacteristic(*characteristic, value.to_vec()))?;
        self.state.store((*characteristic).into(), value);
        self.state.respond_later(TransportEvent::CharacteristicWrite {
            request,
            characteristic: *characteristic,
            status: GattStatus::SUCCESS,
            value: value.to_vec(),
        });
        Ok(())
    }

    fn read_descriptor(&self, request: RequestId, descriptor: &DescriptorId) -> Result<(), Error> {
        self.state.record_request(request, Call::ReadDescriptor(*descriptor))?;
        self.state.respond_later(TransportEvent::DescriptorRead {
            request,
            descriptor: *descriptor,
            status: GattStatus::SUCCESS,
            value: self.state.read((*descriptor).into()),
        });
        Ok(())
    }

    fn write_descriptor(&self, request: RequestId, descriptor: &DescriptorId, value: &[u8])
        -> Result<(), Error>
    {
        self.state.record_request(request, Call::WriteDescriptor(*descriptor, value.to_vec()))?;
        self.state.store((*descriptor).into(), value);
        self.state.respond_later(TransportEvent::DescriptorWrite {
            request,
            descriptor: *descriptor,
            status: GattStatus::SUCCESS,
            value: value.to_vec(),
        });
        Ok(())
    }

    fn set_notification(&self, characteristic: &CharacteristicId, enable: bool) -> Result<(), Error> {
        self.state.record(Call::SetNotification(*characteristic, enable))
    }

    fn disconnect(&self) {
        self.state.calls.send(Call::Disconnect);
        self.state.respond_later(TransportEvent::ConnectionStateChanged {
            status: GattStatus::SUCCESS,
            new_state: ConnectionState::Disconnected,
        });
    }

    fn close(&self) {
        self.state.calls.send(Call::Close);
    }
}
