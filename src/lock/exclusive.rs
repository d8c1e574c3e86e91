use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::cancel::WakeWaiters;
use super::wait::{self, Attempt, WaitOutcome};
use super::{CancelToken, Lock, LockError, OwnerId};

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<OwnerId>,
    holds: usize,
}

impl Ownership {
    fn available_to(&self, caller: OwnerId) -> bool {
        self.owner.map_or(true, |owner| owner == caller)
    }
}

struct Shared {
    state: Mutex<Ownership>,
    wake: Condvar,
}

impl Shared {
    fn lock_state(&self) -> Result<MutexGuard<'_, Ownership>, LockError> {
        self.state
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))
    }
}

impl WakeWaiters for Shared {
    fn wake_waiters(&self) {
        let _state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.wake.notify_all();
    }
}

/// Reentrant mutual-exclusion lock backed by `Mutex<Ownership>` + `Condvar`.
///
/// The owning thread may lock it again; each `lock` needs a matching
/// `unlock` from the same thread.
pub struct ExclusiveLock {
    shared: Arc<Shared>,
}

impl ExclusiveLock {
    pub fn new() -> Self {
        ExclusiveLock {
            shared: Arc::new(Shared {
                state: Mutex::new(Ownership::default()),
                wake: Condvar::new(),
            }),
        }
    }

    /// Whether any thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .owner
            .is_some()
    }

    fn acquire(&self, attempt: Attempt<'_>) -> Result<bool, LockError> {
        let caller = OwnerId::current();
        let cancel = attempt.cancel();
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(LockError::Interrupted);
        }
        let _registration = cancel.map(|token| token.register(self.shared.clone()));

        let state = self.shared.lock_state()?;
        let (mut state, outcome) = wait::wait_until(
            &self.shared.wake,
            state,
            attempt.deadline(),
            cancel,
            |ownership| ownership.available_to(caller),
        )?;
        if outcome != WaitOutcome::Ready {
            return outcome.into_result();
        }
        state.owner = Some(caller);
        state.holds += 1;
        Ok(true)
    }
}

impl Default for ExclusiveLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExclusiveLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ExclusiveLock")
            .field("owner", &state.owner)
            .field("holds", &state.holds)
            .finish()
    }
}

impl Lock for ExclusiveLock {
    fn lock(&self) -> Result<(), LockError> {
        self.acquire(Attempt::Blocking).map(|_| ())
    }

    fn lock_interruptibly(&self, cancel: &CancelToken) -> Result<(), LockError> {
        self.acquire(Attempt::Interruptible(cancel)).map(|_| ())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        self.acquire(Attempt::Immediate)
    }

    fn try_lock_for(&self, timeout: Duration, cancel: &CancelToken) -> Result<bool, LockError> {
        self.acquire(Attempt::Timed(timeout, cancel))
    }

    fn unlock(&self) -> Result<(), LockError> {
        let caller = OwnerId::current();
        let mut state = self.shared.lock_state()?;
        if state.owner != Some(caller) || state.holds == 0 {
            return Err(LockError::illegal_state(
                "attempt to unlock exclusive lock not held by current thread",
            ));
        }
        state.holds -= 1;
        if state.holds == 0 {
            state.owner = None;
            self.shared.wake.notify_all();
        }
        Ok(())
    }

    fn hold_count(&self) -> usize {
        let caller = OwnerId::current();
        let state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if state.owner == Some(caller) {
            state.holds
        } else {
            0
        }
    }
}
