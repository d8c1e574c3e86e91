//! Bookkeeping for `TriModeLock`, always mutated under its internal mutex.
//!
//! Update and Write share one exclusive owner slot: whoever holds Update or
//! Write is the `exclusive` owner, and no other thread can take either while
//! the slot is occupied. Readers coexist with an Update holder but never with
//! a Write holder.

use std::collections::HashMap;

use serde::Serialize;

use crate::lock::{LockError, OwnerId};

/// Which of the three views an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Read,
    Update,
    Write,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Read => "read",
            Mode::Update => "update",
            Mode::Write => "write",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LockState {
    readers: HashMap<OwnerId, usize>,
    read_holds: usize,
    exclusive: Option<OwnerId>,
    update_holds: usize,
    write_holds: usize,
    /// A write is waiting for readers to drain; new readers stay out.
    write_pending: bool,
}

impl LockState {
    /// Usage checks, performed before any waiting.
    pub(crate) fn validate(&self, mode: Mode, caller: OwnerId) -> Result<(), LockError> {
        match mode {
            Mode::Read if self.exclusive == Some(caller) => {
                let held = if self.write_holds > 0 { "write" } else { "update" };
                Err(LockError::illegal_state(format!(
                    "cannot acquire read lock as {} lock is in use by current thread",
                    held
                )))
            }
            Mode::Update | Mode::Write if self.readers.contains_key(&caller) => {
                Err(LockError::illegal_state(format!(
                    "cannot acquire {} lock as read lock is in use by current thread",
                    mode.as_str()
                )))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn can_read(&self, caller: OwnerId) -> bool {
        if self.write_holds > 0 {
            return false;
        }
        !self.write_pending || self.readers.contains_key(&caller)
    }

    /// Whether `caller` can occupy (or already occupies) the exclusive slot.
    pub(crate) fn can_claim(&self, caller: OwnerId) -> bool {
        self.exclusive.map_or(true, |owner| owner == caller)
    }

    /// Whether a write by the exclusive owner can be granted now.
    pub(crate) fn readers_drained(&self) -> bool {
        self.read_holds == 0
    }

    pub(crate) fn grant_read(&mut self, caller: OwnerId) {
        *self.readers.entry(caller).or_insert(0) += 1;
        self.read_holds += 1;
    }

    pub(crate) fn grant_update(&mut self, caller: OwnerId) {
        self.exclusive = Some(caller);
        self.update_holds += 1;
    }

    /// Occupy the exclusive slot ahead of a write. Returns `true` if the slot
    /// was free, meaning an abandoned write must give it back.
    pub(crate) fn claim(&mut self, caller: OwnerId) -> bool {
        let fresh = self.exclusive.is_none();
        self.exclusive = Some(caller);
        fresh
    }

    pub(crate) fn set_write_pending(&mut self, pending: bool) {
        self.write_pending = pending;
    }

    pub(crate) fn grant_write(&mut self) {
        self.write_pending = false;
        self.write_holds += 1;
    }

    /// Undo a write that timed out or was interrupted after claiming.
    pub(crate) fn abandon_write(&mut self, fresh_claim: bool) {
        self.write_pending = false;
        if fresh_claim && self.update_holds == 0 && self.write_holds == 0 {
            self.exclusive = None;
        }
    }

    /// Release one hold. Returns whether waiters may now make progress.
    pub(crate) fn release(&mut self, mode: Mode, caller: OwnerId) -> Result<bool, LockError> {
        match mode {
            Mode::Read => self.release_read(caller),
            Mode::Update | Mode::Write => self.release_exclusive(mode, caller),
        }
    }

    fn release_read(&mut self, caller: OwnerId) -> Result<bool, LockError> {
        let remaining = match self.readers.get_mut(&caller) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => {
                return Err(LockError::illegal_state(
                    "attempt to unlock read lock, not locked by current thread",
                ))
            }
        };
        if remaining == 0 {
            self.readers.remove(&caller);
        }
        self.read_holds -= 1;
        Ok(self.read_holds == 0)
    }

    fn release_exclusive(&mut self, mode: Mode, caller: OwnerId) -> Result<bool, LockError> {
        let holds = match mode {
            Mode::Update => &mut self.update_holds,
            _ => &mut self.write_holds,
        };
        if self.exclusive != Some(caller) || *holds == 0 {
            return Err(LockError::illegal_state(format!(
                "attempt to unlock {} lock, not locked by current thread",
                mode.as_str()
            )));
        }
        *holds -= 1;
        let released = *holds == 0;
        if self.update_holds == 0 && self.write_holds == 0 {
            self.exclusive = None;
        }
        Ok(released)
    }

    pub(crate) fn hold_count(&self, mode: Mode, caller: OwnerId) -> usize {
        match mode {
            Mode::Read => self.readers.get(&caller).copied().unwrap_or(0),
            Mode::Update if self.exclusive == Some(caller) => self.update_holds,
            Mode::Write if self.exclusive == Some(caller) => self.write_holds,
            _ => 0,
        }
    }

    pub(crate) fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            readers: self.readers.len(),
            read_holds: self.read_holds,
            update_holds: self.update_holds,
            write_holds: self.write_holds,
            exclusively_owned: self.exclusive.is_some(),
            write_pending: self.write_pending,
        }
    }
}

/// Point-in-time copy of a `TriModeLock`'s counters, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LockSnapshot {
    /// Distinct threads holding Read.
    pub readers: usize,
    /// Read holds across all threads, counting reentrant ones.
    pub read_holds: usize,
    pub update_holds: usize,
    pub write_holds: usize,
    /// Some thread holds Update or Write, or is claiming Write.
    pub exclusively_owned: bool,
    /// A Write is waiting for readers to drain.
    pub write_pending: bool,
}

impl LockSnapshot {
    pub fn is_free(&self) -> bool {
        self.read_holds == 0 && !self.exclusively_owned
    }
}
