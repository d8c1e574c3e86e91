use std::fmt;
use std::marker::PhantomData;

use super::{Lock, LockError};

/// Releases one hold on a lock when dropped.
///
/// Must be dropped on the thread that acquired it, so it is not `Send`:
///
/// ```compile_fail
/// use tri_lock::{ExclusiveLock, Lock};
///
/// fn assert_send<T: Send>(_: T) {}
///
/// let lock = ExclusiveLock::new();
/// assert_send(lock.guard().unwrap());
/// ```
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    lock: Option<&'a dyn Lock>,
    _not_send: PhantomData<*const ()>,
}

impl<'a> LockGuard<'a> {
    /// Wrap a hold the caller has already taken.
    pub fn new(lock: &'a dyn Lock) -> Self {
        LockGuard {
            lock: Some(lock),
            _not_send: PhantomData,
        }
    }

    /// Release now and report the result instead of logging it.
    pub fn unlock(mut self) -> Result<(), LockError> {
        match self.lock.take() {
            Some(lock) => lock.unlock(),
            None => Ok(()),
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            if let Err(err) = lock.unlock() {
                tracing::error!(error = %err, "failed to release lock guard");
            }
        }
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("held", &self.lock.is_some())
            .finish()
    }
}

/// Holds every lock of a successful multi-acquisition and releases them in
/// reverse acquisition order when dropped. Like [`LockGuard`], it stays on
/// the acquiring thread:
///
/// ```compile_fail
/// use tri_lock::{ExclusiveLock, LockCoordinator};
///
/// fn assert_send<T: Send>(_: T) {}
///
/// let lock = ExclusiveLock::new();
/// assert_send(LockCoordinator::guard_all(&[&lock]).unwrap());
/// ```
#[must_use = "the locks are released as soon as the guard is dropped"]
pub struct MultiLockGuard<'a> {
    locks: Vec<&'a dyn Lock>,
    _not_send: PhantomData<*const ()>,
}

impl<'a> MultiLockGuard<'a> {
    pub(crate) fn new(locks: Vec<&'a dyn Lock>) -> Self {
        MultiLockGuard {
            locks,
            _not_send: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Release now, last acquired first, returning the first failure. Locks
    /// still held after a failure are released by `Drop`, which only logs.
    pub fn unlock(mut self) -> Result<(), LockError> {
        while let Some(lock) = self.locks.pop() {
            lock.unlock()?;
        }
        Ok(())
    }
}

impl Drop for MultiLockGuard<'_> {
    fn drop(&mut self) {
        while let Some(lock) = self.locks.pop() {
            if let Err(err) = lock.unlock() {
                tracing::error!(error = %err, remaining = self.locks.len(), "failed to release lock in multi-lock guard");
            }
        }
    }
}

impl fmt::Debug for MultiLockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiLockGuard")
            .field("held", &self.locks.len())
            .finish()
    }
}
