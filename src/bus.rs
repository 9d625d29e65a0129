//! Listener registries and the callback context they deliver on.
//!
//! An [`EventBus`] holds listeners by [`Weak`] reference only, so registering a listener never
//! keeps it alive. Dropped listeners are pruned on the next registration or dispatch.
//! Every dispatch runs on a [`DispatchQueue`]: a single thread executing posted jobs in order,
//! so listeners of one bus always observe events in the order they were dispatched.

use log::*;
use static_assertions::assert_impl_all;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, ThreadId};

use crate::error::Error;
use crate::sync::{self, lock, SharedSender};

type Job = Box<dyn FnOnce() + Send>;

struct QueueInner {
    label: String,
    sender: SharedSender<Job>,
    thread: ThreadId,
}

/// Serial callback context. Cloning shares the same thread.
///
/// The thread exits once every clone (and every bus holding one) has been dropped.
#[derive(Clone)]
pub struct DispatchQueue(Arc<QueueInner>);

assert_impl_all!(DispatchQueue: Send, Sync);

impl DispatchQueue {
    pub fn new(label: &str) -> Result<Self, Error> {
        let (sender, receiver) = sync::channel::<Job>();
        let thread_label = label.to_owned();
        let handle = thread::Builder::new()
            .name(label.to_owned())
            .spawn(move || {
                for job in receiver {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!("listener panicked on queue `{}`", thread_label);
                    }
                }
                trace!("queue `{}` stopped", thread_label);
            })?;
        Ok(Self(Arc::new(QueueInner {
            label: label.to_owned(),
            sender: SharedSender::new(sender),
            thread: handle.thread().id(),
        })))
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Schedules `job` after everything posted so far.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) {
        if !self.0.sender.send(Box::new(job)) {
            warn!("queue `{}` is gone, dropping job", self.0.label);
        }
    }

    /// Whether the caller is running on this queue.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.0.thread
    }

    /// Blocks until every job posted before this call has run.
    /// Returns immediately when called from the queue itself.
    pub fn flush(&self) {
        if self.is_current() {
            return;
        }
        let (tx, rx) = sync::channel();
        self.post(move || {
            let _ = tx.send(());
        });
        let _ = rx.recv();
    }
}

/// Registry of listeners for one event category.
pub struct EventBus<L: ?Sized> {
    listeners: Arc<Mutex<Vec<Weak<L>>>>,
    queue: DispatchQueue,
}

impl<L: ?Sized> Clone for EventBus<L> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
            queue: self.queue.clone(),
        }
    }
}

fn addr<L: ?Sized>(w: &Weak<L>) -> *const () {
    w.as_ptr() as *const ()
}

fn housekeeping<L: ?Sized>(listeners: &mut Vec<Weak<L>>) {
    let before = listeners.len();
    listeners.retain(|w| w.strong_count() > 0);
    if listeners.len() != before {
        trace!("pruned {} dropped listener(s)", before - listeners.len());
    }
}

impl<L: ?Sized + Send + Sync + 'static> EventBus<L> {
    pub fn new(queue: DispatchQueue) -> Self {
        Self {
            listeners: Default::default(),
            queue,
        }
    }

    pub fn queue(&self) -> &DispatchQueue {
        &self.queue
    }

    /// Returns `false` if the listener is already registered.
    pub fn register(&self, listener: &Arc<L>) -> bool {
        let target = Arc::as_ptr(listener) as *const ();
        let mut listeners = lock(&self.listeners);
        housekeeping(&mut listeners);
        if listeners.iter().any(|w| addr(w) == target) {
            return false;
        }
        listeners.push(Arc::downgrade(listener));
        true
    }

    /// Returns whether the listener was registered.
    pub fn unregister(&self, listener: &Arc<L>) -> bool {
        let target = Arc::as_ptr(listener) as *const ();
        let mut listeners = lock(&self.listeners);
        let present = listeners.iter().any(|w| addr(w) == target);
        listeners.retain(|w| addr(w) != target);
        housekeeping(&mut listeners);
        present
    }

    /// Number of registered listeners that are still alive.
    pub fn len(&self) -> usize {
        lock(&self.listeners).iter().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `f` to every listener registered at the time of the call, in registration order.
    ///
    /// Each listener is re-checked right before delivery, so listeners may register or
    /// unregister (themselves or others) from inside `f`. A listener unregistered before its
    /// turn receives nothing from this dispatch; a listener registered after the call first
    /// hears from the next one.
    pub fn dispatch<F>(&self, f: F)
        where F: Fn(&L) + Send + 'static
    {
        let snapshot = {
            let mut listeners = lock(&self.listeners);
            housekeeping(&mut listeners);
            listeners.clone()
        };
        if snapshot.is_empty() {
            return;
        }
        let listeners = self.listeners.clone();
        self.queue.post(move || {
            for weak in snapshot {
                let target = addr(&weak);
                if !lock(&listeners).iter().any(|w| addr(w) == target) {
                    continue;
                }
                if let Some(listener) = weak.upgrade() {
                    f(&listener);
                }
            }
        });
    }
}
