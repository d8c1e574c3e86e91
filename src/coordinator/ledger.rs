use crate::lock::{Lock, LockError};

/// Locks acquired so far by one multi-acquire call, in acquisition order.
///
/// Dropped without `commit` or `rollback` (a lock implementation panicked),
/// it still releases everything it recorded, newest first.
pub(crate) struct AcquisitionLedger<'a> {
    acquired: Vec<&'a dyn Lock>,
    total: usize,
}

impl<'a> AcquisitionLedger<'a> {
    pub(crate) fn with_capacity(total: usize) -> Self {
        AcquisitionLedger {
            acquired: Vec::with_capacity(total),
            total,
        }
    }

    pub(crate) fn record(&mut self, lock: &'a dyn Lock) {
        self.acquired.push(lock);
    }

    /// Keep every recorded lock held and hand them to the caller.
    pub(crate) fn commit(mut self) -> Vec<&'a dyn Lock> {
        std::mem::take(&mut self.acquired)
    }

    /// Release everything recorded, newest first.
    ///
    /// `cause` is the fault that stopped the acquisition, if any. The first
    /// release failure aborts the rollback and comes back as
    /// [`LockError::Fatal`]; no further releases are attempted.
    pub(crate) fn rollback(mut self, cause: Option<&LockError>) -> Result<(), LockError> {
        tracing::debug!(
            acquired = self.acquired.len(),
            total = self.total,
            cause = ?cause,
            "rolling back partial lock acquisition"
        );
        while let Some(lock) = self.acquired.pop() {
            if let Err(release) = lock.unlock() {
                tracing::error!(
                    error = %release,
                    unreleased = self.acquired.len(),
                    "lock release failed during rollback"
                );
                // Whatever is still recorded must not be touched by Drop either.
                self.acquired.clear();
                return Err(LockError::Fatal {
                    cause: cause.cloned().map(Box::new),
                    release: Box::new(release),
                });
            }
        }
        Ok(())
    }

    /// Roll back, then report `cause` unless the rollback itself failed.
    pub(crate) fn abort(self, cause: LockError) -> LockError {
        match self.rollback(Some(&cause)) {
            Ok(()) => cause,
            Err(fatal) => fatal,
        }
    }
}

impl Drop for AcquisitionLedger<'_> {
    fn drop(&mut self) {
        while let Some(lock) = self.acquired.pop() {
            if let Err(err) = lock.unlock() {
                tracing::error!(error = %err, "lock release failed while unwinding");
                self.acquired.clear();
            }
        }
    }
}
