//! Reentrant read/update/write locking with a deadlock-free upgrade path,
//! plus all-or-nothing acquisition of arbitrary lock sets.
//!
//! - [`TriModeLock`]: one state machine exposing Read, Update and Write
//!   views. Update is exclusive among updaters but admits readers; its
//!   holder can upgrade to Write without releasing it.
//! - [`LockCoordinator`]: acquires a list of [`Lock`]s in order and rolls
//!   back in reverse order on any failure.
//! - [`ExclusiveLock`]: a plain reentrant mutual-exclusion lock for mixing
//!   into coordinated sets.
//! - [`InMemoryLockManager`]: lazily created per-key locks.

mod coordinator;
mod lock;
mod tri_mode;

pub use coordinator::LockCoordinator;
pub use lock::{
    CancelToken, ExclusiveLock, InMemoryLockManager, Lock, LockError, LockGuard, LockManager,
    MultiLockGuard, OwnerId,
};
pub use tri_mode::{LockSnapshot, LockView, Mode, TriModeLock, TriModeOptions};
