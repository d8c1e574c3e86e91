use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{Mode, Shared};
use crate::lock::wait::Attempt;
use crate::lock::{CancelToken, Lock, LockError};

/// One of the three acquisition roles of a [`super::TriModeLock`].
///
/// Views are handles onto the shared state; holds are counted per thread and
/// per view.
pub struct LockView {
    shared: Arc<Shared>,
    mode: Mode,
}

impl LockView {
    pub(super) fn new(shared: Arc<Shared>, mode: Mode) -> Self {
        LockView { shared, mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Condition variables are not supported on any view. Always fails with
    /// [`LockError::Unsupported`].
    pub fn new_condition(&self) -> Result<Infallible, LockError> {
        Err(LockError::Unsupported("this lock does not support conditions"))
    }
}

impl Lock for LockView {
    fn lock(&self) -> Result<(), LockError> {
        self.shared.acquire(self.mode, Attempt::Blocking).map(|_| ())
    }

    fn lock_interruptibly(&self, cancel: &CancelToken) -> Result<(), LockError> {
        self.shared
            .acquire(self.mode, Attempt::Interruptible(cancel))
            .map(|_| ())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        self.shared.acquire(self.mode, Attempt::Immediate)
    }

    fn try_lock_for(&self, timeout: Duration, cancel: &CancelToken) -> Result<bool, LockError> {
        self.shared.acquire(self.mode, Attempt::Timed(timeout, cancel))
    }

    fn unlock(&self) -> Result<(), LockError> {
        self.shared.release(self.mode)
    }

    fn hold_count(&self) -> usize {
        self.shared.hold_count(self.mode)
    }
}

impl fmt::Debug for LockView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockView")
            .field("lock", &self.shared.name)
            .field("mode", &self.mode)
            .finish()
    }
}
