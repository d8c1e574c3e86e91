//! All-or-nothing acquisition of a list of locks.
//!
//! Locks are taken in the order given. If any step fails, everything taken
//! so far is released in reverse order before the call returns, so a caller
//! ends up holding either every lock or none of them.

mod ledger;

use std::time::{Duration, Instant};

use crate::lock::{CancelToken, Lock, LockError, MultiLockGuard};
use ledger::AcquisitionLedger;

/// Acquires heterogeneous lock sets as one unit.
///
/// Stateless; each call keeps its own ledger of what it has acquired. Any
/// [`Lock`] implementation can take part, including views of different
/// [`crate::TriModeLock`]s in one call.
///
/// A release failure while rolling back is returned as [`LockError::Fatal`]:
/// the set is then partially held and the caller must not assume either
/// outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockCoordinator;

impl LockCoordinator {
    /// Acquire every lock with its blocking `lock()`. On a fault, release
    /// what was taken and return the fault unchanged. Later locks are never
    /// attempted.
    pub fn acquire_all(locks: &[&dyn Lock]) -> Result<(), LockError> {
        Self::acquire_each(locks, |lock| lock.lock()).map(|_| ())
    }

    /// Like [`LockCoordinator::acquire_all`], using `lock_interruptibly`.
    /// Cancellation rolls back and returns [`LockError::Interrupted`].
    pub fn acquire_all_interruptibly(
        cancel: &CancelToken,
        locks: &[&dyn Lock],
    ) -> Result<(), LockError> {
        Self::acquire_each(locks, |lock| lock.lock_interruptibly(cancel)).map(|_| ())
    }

    /// Try every lock without blocking. Returns `Ok(false)`, holding
    /// nothing, as soon as one lock is unavailable.
    pub fn try_acquire_all(locks: &[&dyn Lock]) -> Result<bool, LockError> {
        Self::try_each(locks, |lock| lock.try_lock()).map(|acquired| acquired.is_some())
    }

    /// Try every lock within one shared `timeout`.
    ///
    /// The deadline is fixed before the first lock. Each lock gets whatever
    /// is left of it; once the budget is spent the remaining locks are still
    /// tried with a zero timeout, so uncontended ones are picked up and
    /// contended ones fail without waiting.
    pub fn try_acquire_all_for(
        timeout: Duration,
        cancel: &CancelToken,
        locks: &[&dyn Lock],
    ) -> Result<bool, LockError> {
        Self::try_each_within(timeout, cancel, locks).map(|acquired| acquired.is_some())
    }

    /// [`LockCoordinator::acquire_all`], returning a guard that releases the
    /// set in reverse order when dropped.
    pub fn guard_all<'a>(locks: &[&'a dyn Lock]) -> Result<MultiLockGuard<'a>, LockError> {
        Self::acquire_each(locks, |lock| lock.lock()).map(MultiLockGuard::new)
    }

    /// [`LockCoordinator::acquire_all_interruptibly`] with a guard.
    pub fn guard_all_interruptibly<'a>(
        cancel: &CancelToken,
        locks: &[&'a dyn Lock],
    ) -> Result<MultiLockGuard<'a>, LockError> {
        Self::acquire_each(locks, |lock| lock.lock_interruptibly(cancel)).map(MultiLockGuard::new)
    }

    /// [`LockCoordinator::try_acquire_all`] with a guard.
    pub fn try_guard_all<'a>(locks: &[&'a dyn Lock]) -> Result<Option<MultiLockGuard<'a>>, LockError> {
        Self::try_each(locks, |lock| lock.try_lock()).map(|acquired| acquired.map(MultiLockGuard::new))
    }

    /// [`LockCoordinator::try_acquire_all_for`] with a guard.
    pub fn try_guard_all_for<'a>(
        timeout: Duration,
        cancel: &CancelToken,
        locks: &[&'a dyn Lock],
    ) -> Result<Option<MultiLockGuard<'a>>, LockError> {
        Self::try_each_within(timeout, cancel, locks)
            .map(|acquired| acquired.map(MultiLockGuard::new))
    }

    fn acquire_each<'a, F>(locks: &[&'a dyn Lock], mut step: F) -> Result<Vec<&'a dyn Lock>, LockError>
    where
        F: FnMut(&dyn Lock) -> Result<(), LockError>,
    {
        let mut ledger = AcquisitionLedger::with_capacity(locks.len());
        for &lock in locks {
            if let Err(err) = step(lock) {
                return Err(ledger.abort(err));
            }
            ledger.record(lock);
        }
        Ok(ledger.commit())
    }

    fn try_each<'a, F>(
        locks: &[&'a dyn Lock],
        mut step: F,
    ) -> Result<Option<Vec<&'a dyn Lock>>, LockError>
    where
        F: FnMut(&dyn Lock) -> Result<bool, LockError>,
    {
        let mut ledger = AcquisitionLedger::with_capacity(locks.len());
        for &lock in locks {
            match step(lock) {
                Ok(true) => ledger.record(lock),
                Ok(false) => {
                    ledger.rollback(None)?;
                    return Ok(None);
                }
                Err(err) => return Err(ledger.abort(err)),
            }
        }
        Ok(Some(ledger.commit()))
    }

    fn try_each_within<'a>(
        timeout: Duration,
        cancel: &CancelToken,
        locks: &[&'a dyn Lock],
    ) -> Result<Option<Vec<&'a dyn Lock>>, LockError> {
        let deadline = Instant::now().checked_add(timeout);
        Self::try_each(locks, |lock| {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            lock.try_lock_for(remaining, cancel)
        })
    }
}
