use std::sync::Arc;

use super::LockError;

/// Factory trait for obtaining per-key locks.
///
/// A cache or connection pool asks the manager for the lock guarding one
/// key. The default `InMemoryLockManager` stores locks in a `HashMap`.
pub trait LockManager: Send + Sync {
    /// The concrete lock type returned by this manager.
    type Lock: Send + Sync;

    /// Get (or create) the lock for the given identifier.
    ///
    /// Repeated calls with the same `id` must return the same logical lock
    /// (the same `Arc` for in-memory managers).
    fn get_lock(&self, id: &str) -> Result<Arc<Self::Lock>, LockError>;
}
