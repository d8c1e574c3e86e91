//! Cancellation for interruptible and timed lock acquisitions.
//!
//! A waiting lock registers itself with the token for the duration of the
//! wait. `cancel()` sets the flag and then asks every registered lock to wake
//! its waiters, so a blocked thread notices without polling.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Implemented by locks that can be woken when a token is cancelled.
///
/// `wake_waiters` must take the lock's internal state mutex before notifying,
/// otherwise a waiter that checked the flag just before the cancel could miss
/// the notification.
pub(crate) trait WakeWaiters: Send + Sync {
    fn wake_waiters(&self);
}

struct Listener {
    id: u64,
    target: Arc<dyn WakeWaiters>,
}

struct Inner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

/// Cloneable cancellation handle. Clones share the same flag.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Request cancellation and wake every acquisition currently waiting on
    /// this token. Cancellation stays set until [`CancelToken::reset`].
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let targets: Vec<Arc<dyn WakeWaiters>> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|listener| listener.target.clone())
            .collect();
        for target in targets {
            target.wake_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the cancellation flag so the token can be reused.
    pub fn reset(&self) {
        self.inner.cancelled.store(false, Ordering::SeqCst);
    }

    pub(crate) fn register(&self, target: Arc<dyn WakeWaiters>) -> Registration<'_> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Listener { id, target });
        Registration { token: self, id }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Removes the listener when the wait ends.
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|listener| listener.id != self.id);
    }
}
