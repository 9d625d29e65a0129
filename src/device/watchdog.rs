//! Single-shot "long time no see" timer.

use log::*;
use std::sync::mpsc::RecvTimeoutError;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::sync::{self, Receiver, SharedSender};

pub(crate) enum Command {
    Arm,
    Cancel,
    Stop,
}

pub(crate) struct Watchdog {
    sender: SharedSender<Command>,
}

/// Runs the timer thread fed by [`Watchdog::new`]. `on_fire` runs on it each time an armed
/// period elapses.
pub(crate) fn spawn(
    receiver: Receiver<Command>,
    name: String,
    timeout: Duration,
    mut on_fire: impl FnMut() + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    let handle = thread::Builder::new()
        .name(name)
        .spawn(move || {
            let mut deadline: Option<Instant> = None;
            loop {
                let cmd = match deadline {
                    None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    Some(d) => receiver.recv_timeout(d.saturating_duration_since(Instant::now())),
                };
                match cmd {
                    Ok(Command::Arm) => deadline = Some(Instant::now() + timeout),
                    Ok(Command::Cancel) => deadline = None,
                    Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        deadline = None;
                        on_fire();
                    }
                }
            }
            trace!("watchdog stopped");
        })?;
    Ok(handle)
}

impl Watchdog {
    pub fn new() -> (Self, Receiver<Command>) {
        let (sender, receiver) = sync::channel();
        (Self { sender: SharedSender::new(sender) }, receiver)
    }

    /// Starts the period, restarting it if already armed.
    pub fn arm(&self) {
        self.sender.send(Command::Arm);
    }

    pub fn cancel(&self) {
        self.sender.send(Command::Cancel);
    }

    pub fn stop(&self) {
        self.sender.send(Command::Stop);
    }
}
