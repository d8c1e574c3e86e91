use std::sync::{Condvar, MutexGuard};
use std::time::{Duration, Instant};

use super::{CancelToken, LockError};

/// How an acquisition is allowed to wait.
#[derive(Clone, Copy)]
pub(crate) enum Attempt<'a> {
    /// Wait as long as needed, ignoring cancellation.
    Blocking,
    /// Wait as long as needed unless the token is cancelled.
    Interruptible(&'a CancelToken),
    /// Succeed only if the lock is available right now.
    Immediate,
    /// Wait until the deadline or cancellation. A zero timeout behaves like
    /// `Immediate`, except that a cancelled token is still reported.
    Timed(Duration, &'a CancelToken),
}

impl<'a> Attempt<'a> {
    pub(crate) fn cancel(&self) -> Option<&'a CancelToken> {
        match *self {
            Attempt::Interruptible(token) | Attempt::Timed(_, token) => Some(token),
            Attempt::Blocking | Attempt::Immediate => None,
        }
    }

    /// `None` means no deadline. Computed once, before any wait begins.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        match *self {
            Attempt::Blocking | Attempt::Interruptible(_) => None,
            Attempt::Immediate => Some(Instant::now()),
            // An overflowing deadline is as good as none.
            Attempt::Timed(timeout, _) => Instant::now().checked_add(timeout),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Attempt::Blocking => "blocking",
            Attempt::Interruptible(_) => "interruptible",
            Attempt::Immediate => "immediate",
            Attempt::Timed(..) => "timed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    Ready,
    TimedOut,
    Interrupted,
}

impl WaitOutcome {
    /// Result reported to the caller when the wait did not end in `Ready`.
    pub(crate) fn into_result(self) -> Result<bool, LockError> {
        match self {
            WaitOutcome::Ready => Ok(true),
            WaitOutcome::TimedOut => Ok(false),
            WaitOutcome::Interrupted => Err(LockError::Interrupted),
        }
    }
}

/// Wait on `wake` until `ready` holds, the deadline passes or `cancel` fires.
///
/// `ready` is checked first, so an available lock is granted even when the
/// deadline has already passed.
pub(crate) fn wait_until<'g, T, F>(
    wake: &Condvar,
    mut guard: MutexGuard<'g, T>,
    deadline: Option<Instant>,
    cancel: Option<&CancelToken>,
    mut ready: F,
) -> Result<(MutexGuard<'g, T>, WaitOutcome), LockError>
where
    F: FnMut(&T) -> bool,
{
    loop {
        if ready(&*guard) {
            return Ok((guard, WaitOutcome::Ready));
        }
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Ok((guard, WaitOutcome::Interrupted));
        }
        match deadline {
            None => {
                guard = wake
                    .wait(guard)
                    .map_err(|e| LockError::Poisoned(e.to_string()))?;
            }
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok((guard, WaitOutcome::TimedOut));
                }
                let (next, _) = wake
                    .wait_timeout(guard, deadline - now)
                    .map_err(|e| LockError::Poisoned(e.to_string()))?;
                guard = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn ready_state_wins_over_expired_deadline() {
        let state = Mutex::new(true);
        let wake = Condvar::new();
        let guard = state.lock().unwrap();
        let (_guard, outcome) =
            wait_until(&wake, guard, Some(Instant::now()), None, |ready| *ready).unwrap();
        assert_eq!(outcome, WaitOutcome::Ready);
    }

    #[test]
    fn expired_deadline_times_out() {
        let state = Mutex::new(false);
        let wake = Condvar::new();
        let guard = state.lock().unwrap();
        let (_guard, outcome) = wait_until(
            &wake,
            guard,
            Some(Instant::now() + Duration::from_millis(5)),
            None,
            |ready| *ready,
        )
        .unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[test]
    fn cancelled_token_interrupts() {
        let state = Mutex::new(false);
        let wake = Condvar::new();
        let token = CancelToken::new();
        token.cancel();
        let guard = state.lock().unwrap();
        let (_guard, outcome) =
            wait_until(&wake, guard, None, Some(&token), |ready| *ready).unwrap();
        assert_eq!(outcome, WaitOutcome::Interrupted);
    }

    #[test]
    fn notified_waiter_sees_new_state() {
        let shared = Arc::new((Mutex::new(false), Condvar::new()));
        let setter = shared.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            *setter.0.lock().unwrap() = true;
            setter.1.notify_all();
        });

        let guard = shared.0.lock().unwrap();
        let (_guard, outcome) =
            wait_until(&shared.1, guard, None, None, |ready| *ready).unwrap();
        assert_eq!(outcome, WaitOutcome::Ready);
        handle.join().unwrap();
    }
}
