use std::time::Duration;

use super::{CancelToken, LockError, LockGuard};

/// The standard lock contract.
///
/// Every `TriModeLock` view and `ExclusiveLock` implements it, and
/// `LockCoordinator` accepts any mix of implementations. Third-party locks
/// (a database advisory lock, a lease) can implement it too.
///
/// Acquire and release must be paired on the same thread. The `guard*`
/// helpers do the pairing automatically.
pub trait Lock: Send + Sync {
    /// Acquire the lock, blocking until it becomes available.
    fn lock(&self) -> Result<(), LockError>;

    /// Acquire the lock, blocking until it becomes available or `cancel`
    /// fires. On `Err(LockError::Interrupted)` nothing was acquired.
    fn lock_interruptibly(&self, cancel: &CancelToken) -> Result<(), LockError>;

    /// Try to acquire the lock without blocking.
    /// Returns `Ok(true)` if acquired, `Ok(false)` if it is held elsewhere.
    fn try_lock(&self) -> Result<bool, LockError>;

    /// Try to acquire the lock, waiting at most `timeout`.
    ///
    /// A zero timeout acquires only if no waiting is needed. Returns
    /// `Ok(false)` on timeout and `Err(LockError::Interrupted)` if `cancel`
    /// fires first; neither leaves anything acquired.
    fn try_lock_for(&self, timeout: Duration, cancel: &CancelToken) -> Result<bool, LockError>;

    /// Release one hold taken by the calling thread.
    fn unlock(&self) -> Result<(), LockError>;

    /// Number of unreleased holds the calling thread has on this lock.
    fn hold_count(&self) -> usize;

    fn guard(&self) -> Result<LockGuard<'_>, LockError>
    where
        Self: Sized,
    {
        self.lock()?;
        Ok(LockGuard::new(self))
    }

    fn guard_interruptibly(&self, cancel: &CancelToken) -> Result<LockGuard<'_>, LockError>
    where
        Self: Sized,
    {
        self.lock_interruptibly(cancel)?;
        Ok(LockGuard::new(self))
    }

    fn try_guard(&self) -> Result<Option<LockGuard<'_>>, LockError>
    where
        Self: Sized,
    {
        Ok(self.try_lock()?.then(|| LockGuard::new(self)))
    }

    fn try_guard_for(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Option<LockGuard<'_>>, LockError>
    where
        Self: Sized,
    {
        Ok(self
            .try_lock_for(timeout, cancel)?
            .then(|| LockGuard::new(self)))
    }
}
