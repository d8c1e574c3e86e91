//! Shared helpers for lock integration tests.
//!
//! - `Worker`: a dedicated thread that runs closures in order, so a test can
//!   take a lock "on thread 1", inspect it from thread 2, then release it on
//!   thread 1 again.
//! - `ScriptedLock`: wraps an `ExclusiveLock` and injects faults, records the
//!   timeouts it is offered, and journals lock/unlock calls.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tri_lock::{CancelToken, ExclusiveLock, Lock, LockError};

type Job = Box<dyn FnOnce() + Send>;

pub struct Worker {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn() -> Self {
        let (jobs, queue) = mpsc::channel::<Job>();
        let handle = thread::spawn(move || {
            for job in queue {
                job();
            }
        });
        Worker {
            jobs: Some(jobs),
            handle: Some(handle),
        }
    }

    /// Run `f` on the worker thread and wait for its result.
    pub fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(f).recv().expect("worker job panicked")
    }

    /// Queue `f` on the worker thread without waiting for it.
    pub fn submit<F, R>(&self, f: F) -> Receiver<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.jobs
            .as_ref()
            .expect("worker stopped")
            .send(Box::new(move || {
                let _ = tx.send(f());
            }))
            .expect("worker thread gone");
        rx
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Give a blocked thread time to reach its wait.
pub fn settle() {
    thread::sleep(Duration::from_millis(50));
}

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

#[derive(Default)]
struct Faults {
    lock: Option<LockError>,
    lock_interruptibly: Option<LockError>,
    try_lock: Option<Result<bool, LockError>>,
    try_lock_for: Option<Result<bool, LockError>>,
    unlock: Option<LockError>,
    panic_on_lock: bool,
}

pub struct ScriptedLock {
    name: String,
    inner: Arc<ExclusiveLock>,
    faults: Faults,
    sleep_after_acquire: Option<Duration>,
    attempts: AtomicUsize,
    offered_timeouts: Mutex<Vec<Duration>>,
    journal: Option<Journal>,
}

impl ScriptedLock {
    pub fn new(name: &str) -> Self {
        Self::wrapping(name, Arc::new(ExclusiveLock::new()))
    }

    /// Share the underlying lock with another holder.
    pub fn wrapping(name: &str, inner: Arc<ExclusiveLock>) -> Self {
        ScriptedLock {
            name: name.to_string(),
            inner,
            faults: Faults::default(),
            sleep_after_acquire: None,
            attempts: AtomicUsize::new(0),
            offered_timeouts: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    pub fn failing_lock(mut self, err: LockError) -> Self {
        self.faults.lock = Some(err);
        self
    }

    pub fn failing_lock_interruptibly(mut self, err: LockError) -> Self {
        self.faults.lock_interruptibly = Some(err);
        self
    }

    pub fn scripted_try_lock(mut self, result: Result<bool, LockError>) -> Self {
        self.faults.try_lock = Some(result);
        self
    }

    pub fn scripted_try_lock_for(mut self, result: Result<bool, LockError>) -> Self {
        self.faults.try_lock_for = Some(result);
        self
    }

    pub fn failing_unlock(mut self, err: LockError) -> Self {
        self.faults.unlock = Some(err);
        self
    }

    pub fn panicking_on_lock(mut self) -> Self {
        self.faults.panic_on_lock = true;
        self
    }

    pub fn sleeping_after_acquire(mut self, pause: Duration) -> Self {
        self.sleep_after_acquire = Some(pause);
        self
    }

    pub fn journaled(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn offered_timeouts(&self) -> Vec<Duration> {
        self.offered_timeouts.lock().unwrap().clone()
    }

    fn note(&self, event: &str) {
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.name));
        }
    }

    fn after_acquire(&self, acquired: bool) -> bool {
        if acquired {
            self.note("lock");
        }
        if let Some(pause) = self.sleep_after_acquire {
            thread::sleep(pause);
        }
        acquired
    }
}

impl Lock for ScriptedLock {
    fn lock(&self) -> Result<(), LockError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.faults.panic_on_lock {
            panic!("{} panicked while locking", self.name);
        }
        if let Some(err) = &self.faults.lock {
            return Err(err.clone());
        }
        self.inner.lock()?;
        self.after_acquire(true);
        Ok(())
    }

    fn lock_interruptibly(&self, cancel: &CancelToken) -> Result<(), LockError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.faults.lock_interruptibly {
            return Err(err.clone());
        }
        self.inner.lock_interruptibly(cancel)?;
        self.after_acquire(true);
        Ok(())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = &self.faults.try_lock {
            return result.clone();
        }
        let acquired = self.inner.try_lock()?;
        Ok(self.after_acquire(acquired))
    }

    fn try_lock_for(&self, timeout: Duration, cancel: &CancelToken) -> Result<bool, LockError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.offered_timeouts.lock().unwrap().push(timeout);
        if let Some(result) = &self.faults.try_lock_for {
            return result.clone();
        }
        let acquired = self.inner.try_lock_for(timeout, cancel)?;
        Ok(self.after_acquire(acquired))
    }

    fn unlock(&self) -> Result<(), LockError> {
        if let Some(err) = &self.faults.unlock {
            return Err(err.clone());
        }
        self.inner.unlock()?;
        self.note("unlock");
        Ok(())
    }

    fn hold_count(&self) -> usize {
        self.inner.hold_count()
    }
}
