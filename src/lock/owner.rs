use std::fmt;
use std::thread::{self, ThreadId};

/// Identity of the context that holds (or wants) a lock.
///
/// Locks record holders as explicit `OwnerId` fields and compare them against
/// the caller's id; nothing is kept in thread-local storage.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(ThreadId);

impl OwnerId {
    /// Identity of the calling thread.
    pub fn current() -> Self {
        OwnerId(thread::current().id())
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({:?})", self.0)
    }
}
