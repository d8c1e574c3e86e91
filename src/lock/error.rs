use std::fmt;

/// Error type for lock operations.
///
/// Timeouts are not errors: timed and non-blocking acquisitions report them
/// as `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The caller broke the lock's usage contract (unlock without a matching
    /// lock, read while holding update/write, update or write while holding read).
    IllegalState(String),
    /// The requested operation is not supported by this lock (condition variables).
    Unsupported(&'static str),
    /// The acquisition was cancelled before the lock was granted.
    Interrupted,
    /// An internal mutex was poisoned (a thread panicked while holding it).
    Poisoned(String),
    /// A third-party lock implementation failed to acquire.
    AcquireFailed(String),
    /// A third-party lock implementation failed to release.
    ReleaseFailed(String),
    /// Any other lock error.
    Other(String),
    /// Releasing a lock failed while rolling back a partial multi-lock
    /// acquisition. The lock set is in an indeterminate state.
    Fatal {
        cause: Option<Box<LockError>>,
        release: Box<LockError>,
    },
}

impl LockError {
    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        LockError::IllegalState(message.into())
    }

    /// Usage violations, including requests for unsupported operations.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, LockError::IllegalState(_) | LockError::Unsupported(_))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, LockError::Interrupted)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, LockError::Fatal { .. })
    }
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::IllegalState(msg) => write!(f, "illegal lock state: {}", msg),
            LockError::Unsupported(msg) => write!(f, "unsupported lock operation: {}", msg),
            LockError::Interrupted => write!(f, "lock acquisition interrupted"),
            LockError::Poisoned(msg) => write!(f, "lock poisoned: {}", msg),
            LockError::AcquireFailed(msg) => write!(f, "lock acquire failed: {}", msg),
            LockError::ReleaseFailed(msg) => write!(f, "lock release failed: {}", msg),
            LockError::Other(msg) => write!(f, "lock error: {}", msg),
            LockError::Fatal {
                cause: Some(cause),
                release,
            } => write!(
                f,
                "rollback after '{}' failed to release a lock: {}",
                cause, release
            ),
            LockError::Fatal {
                cause: None,
                release,
            } => write!(f, "rollback failed to release a lock: {}", release),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LockError::Fatal { release, .. } => Some(release.as_ref()),
            _ => None,
        }
    }
}
