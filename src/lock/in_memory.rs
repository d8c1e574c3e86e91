use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::{LockError, LockManager};

/// In-memory lock manager backed by a `HashMap<String, Arc<L>>`.
///
/// Lazily creates one `L` per unique key and returns the same `Arc` for
/// repeated lookups. Entries are never evicted.
pub struct InMemoryLockManager<L> {
    locks: Mutex<HashMap<String, Arc<L>>>,
}

impl<L> InMemoryLockManager<L> {
    pub fn new() -> Self {
        InMemoryLockManager {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys that have a lock.
    pub fn len(&self) -> Result<usize, LockError> {
        Ok(self.locks()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, LockError> {
        Ok(self.locks()?.is_empty())
    }

    fn locks(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<L>>>, LockError> {
        self.locks
            .lock()
            .map_err(|_| LockError::Poisoned("lock manager map poisoned".into()))
    }
}

impl<L> Default for InMemoryLockManager<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> fmt::Debug for InMemoryLockManager<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.locks.lock().map(|locks| locks.len()).ok();
        f.debug_struct("InMemoryLockManager")
            .field("keys", &keys)
            .finish()
    }
}

impl<L> LockManager for InMemoryLockManager<L>
where
    L: Default + Send + Sync,
{
    type Lock = L;

    fn get_lock(&self, id: &str) -> Result<Arc<L>, LockError> {
        let mut locks = self.locks()?;
        Ok(locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(L::default()))
            .clone())
    }
}
