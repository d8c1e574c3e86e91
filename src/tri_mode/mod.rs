//! Reentrant read/update/write lock.
//!
//! Three views share one state machine:
//!
//! | View   | Granted when                                                  |
//! |--------|---------------------------------------------------------------|
//! | Read   | no other thread holds Write (or is waiting to, see below)     |
//! | Update | no other thread holds Update or Write                         |
//! | Write  | no other thread holds Update or Write, and readers drained    |
//!
//! Update is the upgrade ticket. Only one thread can hold it, so the holder
//! can take Write without releasing Update and without racing another
//! upgrader. While the upgrade waits for existing readers to leave, new
//! readers are held back, so the upgrade always completes once current
//! readers release. Releasing Write hands the lock back to the Update state.
//!
//! Mixing Read with Update or Write on one thread is a usage error reported
//! before any waiting: a reader asking for Update could never be granted Write
//! while it is itself a reader.
//!
//! ```
//! use tri_lock::{Lock, LockError, TriModeLock};
//!
//! fn main() -> Result<(), LockError> {
//!     let lock = TriModeLock::new();
//!     let _update = lock.update().guard()?;
//!     // inspect, decide to modify
//!     let _write = lock.write().guard()?; // upgrade
//!     assert_eq!(lock.write().hold_count(), 1);
//!     Ok(())
//! }
//! ```

mod state;
mod view;

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use crate::lock::wait::{self, Attempt, WaitOutcome};
use crate::lock::{CancelToken, LockError, OwnerId, WakeWaiters};
use state::LockState;

pub use state::{LockSnapshot, Mode};
pub use view::LockView;

/// Construction options for [`TriModeLock`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TriModeOptions {
    /// Name reported in tracing fields and `Debug` output.
    pub name: String,
}

impl Default for TriModeOptions {
    fn default() -> Self {
        Self {
            name: "tri-mode".to_string(),
        }
    }
}

impl TriModeOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

pub(crate) struct Shared {
    name: String,
    state: Mutex<LockState>,
    wake: Condvar,
}

impl Shared {
    fn lock_state(&self) -> Result<MutexGuard<'_, LockState>, LockError> {
        self.state
            .lock()
            .map_err(|e| LockError::Poisoned(format!("{}: {}", self.name, e)))
    }

    /// Shared acquisition path for all views. `Ok(false)` means timed out.
    pub(crate) fn acquire(
        self: &Arc<Self>,
        mode: Mode,
        attempt: Attempt<'_>,
    ) -> Result<bool, LockError> {
        let caller = OwnerId::current();
        let cancel = attempt.cancel();
        let deadline = attempt.deadline();
        // Registered before taking the state mutex; cancel() takes it to notify.
        let _registration = cancel.map(|token| token.register(self.clone()));

        let state = self.lock_state()?;
        state.validate(mode, caller)?;
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(LockError::Interrupted);
        }

        let ready = |s: &LockState| match mode {
            Mode::Read => s.can_read(caller),
            Mode::Update | Mode::Write => s.can_claim(caller),
        };
        if !ready(&*state) {
            tracing::trace!(lock = %self.name, mode = mode.as_str(), attempt = attempt.label(), "waiting to acquire");
        }
        let (mut state, outcome) =
            wait::wait_until(&self.wake, state, deadline, cancel, ready)?;
        if outcome != WaitOutcome::Ready {
            return outcome.into_result();
        }

        match mode {
            Mode::Read => state.grant_read(caller),
            Mode::Update => state.grant_update(caller),
            Mode::Write => {
                let fresh = state.claim(caller);
                if !state.readers_drained() {
                    tracing::trace!(lock = %self.name, attempt = attempt.label(), "write waiting for readers to drain");
                    state.set_write_pending(true);
                }
                let (mut state, outcome) = wait::wait_until(
                    &self.wake,
                    state,
                    deadline,
                    cancel,
                    LockState::readers_drained,
                )?;
                if outcome != WaitOutcome::Ready {
                    state.abandon_write(fresh);
                    self.wake.notify_all();
                    return outcome.into_result();
                }
                state.grant_write();
            }
        }
        Ok(true)
    }

    pub(crate) fn release(&self, mode: Mode) -> Result<(), LockError> {
        let caller = OwnerId::current();
        let mut state = self.lock_state()?;
        if state.release(mode, caller)? {
            self.wake.notify_all();
        }
        Ok(())
    }

    pub(crate) fn hold_count(&self, mode: Mode) -> usize {
        let caller = OwnerId::current();
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .hold_count(mode, caller)
    }
}

impl WakeWaiters for Shared {
    fn wake_waiters(&self) {
        let _state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.wake.notify_all();
    }
}

/// A lock with Read, Update and Write views over one state machine.
///
/// The views are created once and live as long as the lock; hand them to
/// anything that expects a [`crate::Lock`], including [`crate::LockCoordinator`].
pub struct TriModeLock {
    shared: Arc<Shared>,
    read: LockView,
    update: LockView,
    write: LockView,
}

impl TriModeLock {
    pub fn new() -> Self {
        Self::with_options(TriModeOptions::default())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::with_options(TriModeOptions::named(name))
    }

    pub fn with_options(options: TriModeOptions) -> Self {
        let shared = Arc::new(Shared {
            name: options.name,
            state: Mutex::new(LockState::default()),
            wake: Condvar::new(),
        });
        TriModeLock {
            read: LockView::new(shared.clone(), Mode::Read),
            update: LockView::new(shared.clone(), Mode::Update),
            write: LockView::new(shared.clone(), Mode::Write),
            shared,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn read(&self) -> &LockView {
        &self.read
    }

    pub fn update(&self) -> &LockView {
        &self.update
    }

    pub fn write(&self) -> &LockView {
        &self.write
    }

    pub fn view(&self, mode: Mode) -> &LockView {
        match mode {
            Mode::Read => &self.read,
            Mode::Update => &self.update,
            Mode::Write => &self.write,
        }
    }

    pub fn snapshot(&self) -> LockSnapshot {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }
}

impl Default for TriModeLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TriModeLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriModeLock")
            .field("name", &self.shared.name)
            .field("state", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_name() {
        let lock = TriModeLock::new();
        assert_eq!(lock.name(), "tri-mode");
        assert_eq!(TriModeLock::named("cache").name(), "cache");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: TriModeOptions = serde_json::from_str(r#"{"name":"pool"}"#).unwrap();
        assert_eq!(options, TriModeOptions::named("pool"));
        let options: TriModeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, TriModeOptions::default());
    }

    #[test]
    fn view_returns_matching_handle() {
        let lock = TriModeLock::new();
        for mode in [Mode::Read, Mode::Update, Mode::Write] {
            assert_eq!(lock.view(mode).mode(), mode);
        }
    }

    #[test]
    fn snapshot_serializes() {
        let lock = TriModeLock::new();
        let json = serde_json::to_value(lock.snapshot()).unwrap();
        assert_eq!(json["readers"], 0);
        assert_eq!(json["write_pending"], false);
    }

    #[test]
    fn debug_includes_name() {
        let lock = TriModeLock::named("sessions");
        assert!(format!("{:?}", lock).contains("sessions"));
    }
}
