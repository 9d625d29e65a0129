use std::sync::{mpsc, Mutex, MutexGuard, PoisonError};

pub type Sender<T> = mpsc::Sender<T>;
pub type Receiver<T> = mpsc::Receiver<T>;

pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    mpsc::channel()
}

/// Locks the mutex, recovering the guard if a listener panicked while holding it.
pub fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `mpsc::Sender` that can be shared between threads.
pub struct SharedSender<T>(Mutex<Sender<T>>);

impl<T> SharedSender<T> {
    pub fn new(sender: Sender<T>) -> Self {
        Self(Mutex::new(sender))
    }

    /// Returns `false` if the receiving side is gone.
    pub fn send(&self, v: T) -> bool {
        lock(&self.0).send(v).is_ok()
    }
}
