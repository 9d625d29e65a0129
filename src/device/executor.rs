//! Serialized GATT operations: at most one request is outstanding per device.
//!
//! Callers submit [`Operation`]s from any thread. A dedicated worker issues them one at a time
//! and waits for the transport to report the matching completion (or for the deadline to pass)
//! before issuing the next one.

use log::*;
use std::collections::VecDeque;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::error::{Error, ErrorKind, GattStatus};
use crate::event::ErrorEvent;
use crate::gatt::descriptor::{self, DISABLE_NOTIFICATION_VALUE};
use crate::gatt::{AttributeId, CharacteristicId, DescriptorId, Service};
use crate::sync::{self, lock, Receiver, SharedSender};
use crate::transport::{RequestId, Session};
use crate::util::HexBytes;
use super::Shared;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum OperationKind {
    ReadCharacteristic(CharacteristicId),
    WriteCharacteristic(CharacteristicId, Vec<u8>),
    ReadDescriptor(DescriptorId),
    WriteDescriptor(DescriptorId, Vec<u8>),

    /// Toggles local delivery and then writes the value to the configuration descriptor.
    SetNotification(CharacteristicId, [u8; 2]),
}

impl OperationKind {
    /// The attribute whose completion finishes this operation.
    pub fn target(&self) -> AttributeId {
        use OperationKind::*;
        match self {
            ReadCharacteristic(c) | WriteCharacteristic(c, _) => (*c).into(),
            ReadDescriptor(d) | WriteDescriptor(d, _) => (*d).into(),
            SetNotification(c, _) => c.descriptor(descriptor::CLIENT_CHARACTERISTIC_CONFIGURATION).into(),
        }
    }

    fn issue(&self, request: RequestId, session: &dyn Session) -> Result<(), Error> {
        use OperationKind::*;
        match self {
            ReadCharacteristic(c) => session.read_characteristic(request, c),
            WriteCharacteristic(c, value) => session.write_characteristic(request, c, value),
            ReadDescriptor(d) => session.read_descriptor(request, d),
            WriteDescriptor(d, value) => session.write_descriptor(request, d, value),
            SetNotification(c, value) => {
                session.set_notification(c, value != &DISABLE_NOTIFICATION_VALUE)?;
                let cccd = c.descriptor(descriptor::CLIENT_CHARACTERISTIC_CONFIGURATION);
                session.write_descriptor(request, &cccd, value)
            }
        }
    }
}

/// A queued request bound to the service instance it was validated against.
pub(crate) struct Operation {
    pub service: Arc<Service>,
    pub kind: OperationKind,
}

pub(crate) enum Message {
    Submit(Operation),
    Complete {
        seq: u64,
        status: GattStatus,
        value: Vec<u8>,
    },
    Stop,
}

struct InFlight {
    seq: u64,
    target: AttributeId,
}

/// Submission side of the worker, owned by the device.
pub(crate) struct ExecutorHandle {
    sender: SharedSender<Message>,
    in_flight: Mutex<Option<InFlight>>,
}

impl ExecutorHandle {
    pub fn new() -> (Self, Receiver<Message>) {
        let (sender, receiver) = sync::channel();
        (Self {
            sender: SharedSender::new(sender),
            in_flight: Mutex::new(None),
        }, receiver)
    }

    pub fn submit(&self, operation: Operation) -> Result<(), Error> {
        if self.sender.send(Message::Submit(operation)) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Closed, "operation worker has stopped"))
        }
    }

    /// Hands a transport completion to the worker. Returns `false` (and drops the completion)
    /// unless `request` is the outstanding request, e.g. because it already timed out.
    pub fn complete(&self, request: RequestId, target: AttributeId, status: GattStatus, value: Vec<u8>) -> bool {
        let mut in_flight = lock(&self.in_flight);
        match in_flight.as_ref() {
            Some(f) if f.seq == request.get() && f.target == target => {
                let seq = f.seq;
                *in_flight = None;
                self.sender.send(Message::Complete { seq, status, value });
                true
            }
            Some(f) if f.seq == request.get() => {
                warn!("completion {} is for {:?}, but {:?} was requested; discarding", request, target, f.target);
                false
            }
            _ => {
                debug!("{} on {:?} isn't in flight, discarding completion with status {}", request, target, status);
                false
            }
        }
    }

    pub fn stop(&self) {
        self.sender.send(Message::Stop);
    }

    fn begin(&self, seq: u64, target: AttributeId) {
        *lock(&self.in_flight) = Some(InFlight { seq, target });
    }

    /// Clears the slot if it still belongs to `seq`. Returns `false` if a completion took it first.
    fn abandon(&self, seq: u64) -> bool {
        let mut in_flight = lock(&self.in_flight);
        match in_flight.as_ref() {
            Some(f) if f.seq == seq => {
                *in_flight = None;
                true
            }
            _ => false,
        }
    }
}

pub(crate) fn spawn(receiver: Receiver<Message>, shared: Arc<Shared>) -> Result<JoinHandle<()>, Error> {
    let name = format!("gatt-worker-{}", shared.address);
    let handle = thread::Builder::new()
        .name(name)
        .spawn(move || Worker {
            shared,
            receiver,
            backlog: VecDeque::new(),
            seq: 0,
            stopped: false,
        }.run())?;
    Ok(handle)
}

struct Worker {
    shared: Arc<Shared>,
    receiver: Receiver<Message>,
    backlog: VecDeque<Operation>,
    seq: u64,
    stopped: bool,
}

impl Worker {
    fn run(mut self) {
        while let Some(op) = self.next() {
            self.execute(op);
        }
        if !self.backlog.is_empty() {
            debug!("dropping {} queued operation(s) for {}", self.backlog.len(), self.shared.address);
        }
        trace!("operation worker for {} stopped", self.shared.address);
    }

    fn next(&mut self) -> Option<Operation> {
        if self.stopped {
            return None;
        }
        if let Some(op) = self.backlog.pop_front() {
            return Some(op);
        }
        loop {
            match self.receiver.recv() {
                Ok(Message::Submit(op)) => return Some(op),
                Ok(Message::Complete { seq, .. }) => debug!("discarding stale completion #{}", seq),
                Ok(Message::Stop) | Err(_) => return None,
            }
        }
    }

    fn execute(&mut self, op: Operation) {
        self.seq += 1;
        let seq = self.seq;
        let executor = &self.shared.executor;

        let session = match self.shared.session() {
            Some(v) => v,
            None => {
                warn!("#{} {:?}: no session for {}", seq, op.kind, self.shared.address);
                self.shared.emit_error(ErrorEvent::Fatal {
                    service: op.service,
                    error: Error::new(ErrorKind::NotConnected, "no open session"),
                });
                return;
            }
        };

        executor.begin(seq, op.kind.target());
        trace!("issuing #{} {:?}", seq, op.kind);
        let issued = op.kind.issue(RequestId::new(seq), &*session);
        drop(session);
        if let Err(error) = issued {
            executor.abandon(seq);
            error!("couldn't issue #{} {:?}: {}", seq, op.kind, error);
            self.shared.emit_error(ErrorEvent::Fatal {
                service: op.service,
                error,
            });
            return;
        }

        let deadline = Instant::now() + self.shared.config.operation_timeout;
        loop {
            match self.receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(Message::Submit(next)) => self.backlog.push_back(next),
                Ok(Message::Complete { seq: s, status, value }) if s == seq => {
                    self.finish(op, status, value);
                    return;
                }
                Ok(Message::Complete { seq: s, .. }) => debug!("discarding stale completion #{}", s),
                Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => {
                    executor.abandon(seq);
                    self.stopped = true;
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if executor.abandon(seq) {
                        warn!("#{} {:?} timed out after {:?}", seq, op.kind, self.shared.config.operation_timeout);
                        self.shared.emit_error(ErrorEvent::TimedOut { service: op.service });
                        return;
                    }
                    // Completion raced the deadline and is already queued.
                }
            }
        }
    }

    fn finish(&self, op: Operation, status: GattStatus, value: Vec<u8>) {
        if !status.is_success() {
            let error = Error::from_status(status, format_args!("{:?} on {}", op.kind, op.service.id()));
            error!("{}", error);
            self.shared.emit_error(ErrorEvent::Gatt { status, error });
            return;
        }

        let current = lock(&self.shared.registry).is_current(&op.service);
        if !current {
            error!("{:?}: service {} is no longer registered, dropping completion", op.kind, op.service.id());
            return;
        }

        use OperationKind::*;
        match &op.kind {
            ReadCharacteristic(c) => debug!("read {}: {}", c, HexBytes(&value)),
            WriteCharacteristic(c, _) => debug!("wrote {}: {}", c, HexBytes(&value)),
            ReadDescriptor(d) => debug!("read {}: {}", d, HexBytes(&value)),
            WriteDescriptor(d, _) => debug!("wrote {}: {}", d, HexBytes(&value)),
            SetNotification(c, v) => debug!("configured notifications on {}: {}", c, HexBytes(v)),
        }

        let handler = match op.service.handler() {
            Some(v) => v,
            None => return,
        };
        match &op.kind {
            ReadCharacteristic(c) => handler.on_characteristic_read(c.uuid(), &value),
            WriteCharacteristic(c, _) => handler.on_characteristic_write(c.uuid(), &value),
            ReadDescriptor(d) => handler.on_descriptor_read(d.characteristic().uuid(), d.uuid(), &value),
            WriteDescriptor(d, _) => handler.on_descriptor_write(d.characteristic().uuid(), d.uuid(), &value),
            SetNotification(c, v) => handler.on_descriptor_write(c.uuid(),
                descriptor::CLIENT_CHARACTERISTIC_CONFIGURATION, v),
        }
    }
}
