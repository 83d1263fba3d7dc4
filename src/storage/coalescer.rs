// Write coalescer - per-key debounced, single-flight persistence scheduler
//
// One background thread owns every deferred write. Each key has at most one
// pending write and at most one write in flight. Scheduling again before the
// deadline replaces the pending write and restarts its timer, so a burst of N
// calls inside the delay window produces a single physical write.
//
// The thread never touches the library snapshot. It only runs write closures
// over bytes serialized by the caller when the write was scheduled.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::{Result, VideothequeError};

pub type WriteFn = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

type Outcome = std::result::Result<(), String>;

/// Completion handle for a coalesced write.
///
/// Resolves once the write that absorbed this request has actually run. Callers
/// that need durability must `wait()` on it; dropping it is fine otherwise.
#[derive(Debug)]
pub struct SaveHandle {
    rx: Receiver<Outcome>,
}

impl SaveHandle {
    /// Block until the coalesced write has executed.
    pub fn wait(self) -> Result<()> {
        match self.rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(msg)) => Err(VideothequeError::Write(msg)),
            Err(_) => Err(VideothequeError::Write(
                "write coalescer stopped before the save ran".to_string(),
            )),
        }
    }
}

struct Pending {
    deadline: Instant,
    write: WriteFn,
    waiters: Vec<Sender<Outcome>>,
}

#[derive(Default)]
struct KeyState {
    pending: Option<Pending>,
    in_flight: bool,
}

#[derive(Default)]
struct State {
    keys: HashMap<String, KeyState>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking write never holds the lock, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct WriteCoalescer {
    delay: Duration,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WriteCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteCoalescer")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl WriteCoalescer {
    /// Start the scheduler thread. `delay` is the debounce window per key.
    pub fn new(delay: Duration) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("save-coalescer".into())
            .spawn(move || worker_loop(worker_shared))?;

        Ok(Self {
            delay,
            shared,
            worker: Some(worker),
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `write` for `key`, replacing any write still waiting for its deadline.
    pub fn schedule(&self, key: &str, write: WriteFn) -> SaveHandle {
        let (tx, rx) = mpsc::channel();
        let mut state = self.shared.lock();
        let entry = state.keys.entry(key.to_string()).or_default();

        let mut waiters = match entry.pending.take() {
            Some(previous) => {
                log::debug!("Coalescing save for '{}'", key);
                previous.waiters
            }
            None => Vec::new(),
        };
        waiters.push(tx);

        entry.pending = Some(Pending {
            deadline: Instant::now() + self.delay,
            write,
            waiters,
        });
        self.shared.changed.notify_all();

        SaveHandle { rx }
    }

    /// Run `write` now on the caller's thread.
    ///
    /// Waits for an in-flight write of the same key first. A pending write for the
    /// key is dropped; its waiters are resolved with this write's outcome.
    pub fn save_immediate(&self, key: &str, write: WriteFn) -> Result<()> {
        let superseded = {
            let mut state = self.shared.lock();
            while state.keys.get(key).map_or(false, |k| k.in_flight) {
                state = self
                    .shared
                    .changed
                    .wait(state)
                    .unwrap_or_else(|e| e.into_inner());
            }
            let entry = state.keys.entry(key.to_string()).or_default();
            entry.in_flight = true;
            entry.pending.take()
        };

        let result = run_write(key, write);
        let outcome: Outcome = result.as_ref().map(|_| ()).map_err(|e| e.to_string());

        if let Some(pending) = superseded {
            for waiter in pending.waiters {
                let _ = waiter.send(outcome.clone());
            }
        }

        let mut state = self.shared.lock();
        if let Some(entry) = state.keys.get_mut(key) {
            entry.in_flight = false;
        }
        self.shared.changed.notify_all();

        result
    }

    /// Number of keys with a write waiting for its deadline.
    pub fn pending_count(&self) -> usize {
        self.shared
            .lock()
            .keys
            .values()
            .filter(|k| k.pending.is_some())
            .count()
    }

    /// Run every pending write now and wait for all of them.
    /// Returns the first failure, if any.
    pub fn flush(&self) -> Result<()> {
        let receivers = {
            let mut state = self.shared.lock();
            let now = Instant::now();
            let mut receivers = Vec::new();
            for entry in state.keys.values_mut() {
                if let Some(pending) = entry.pending.as_mut() {
                    let (tx, rx) = mpsc::channel();
                    pending.deadline = now;
                    pending.waiters.push(tx);
                    receivers.push(SaveHandle { rx });
                }
            }
            self.shared.changed.notify_all();
            receivers
        };

        let mut first_error = None;
        for handle in receivers {
            if let Err(e) = handle.wait() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for WriteCoalescer {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("Pending saves failed during shutdown: {}", e);
        }

        self.shared.lock().shutdown = true;
        self.shared.changed.notify_all();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Save coalescer thread panicked");
            }
        }
    }
}

/// Execute a write, converting a panic into an error so the scheduler thread survives.
fn run_write(key: &str, write: WriteFn) -> Result<()> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(write)) {
        Ok(result) => result,
        Err(_) => {
            log::error!("Save for '{}' panicked (recovered)", key);
            Err(VideothequeError::Write(format!("save for '{}' panicked", key)))
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    let mut state = shared.lock();

    loop {
        let now = Instant::now();
        let mut due: Option<String> = None;
        let mut next_deadline: Option<Instant> = None;

        for (key, entry) in state.keys.iter() {
            if entry.in_flight {
                continue;
            }
            if let Some(pending) = &entry.pending {
                if state.shutdown || pending.deadline <= now {
                    due = Some(key.clone());
                    break;
                }
                next_deadline = Some(match next_deadline {
                    Some(d) => d.min(pending.deadline),
                    None => pending.deadline,
                });
            }
        }

        if let Some(key) = due {
            let job = state.keys.get_mut(&key).and_then(|entry| {
                entry.in_flight = true;
                entry.pending.take()
            });
            drop(state);

            if let Some(job) = job {
                let outcome: Outcome = run_write(&key, job.write).map_err(|e| e.to_string());
                for waiter in job.waiters {
                    let _ = waiter.send(outcome.clone());
                }
            }

            state = shared.lock();
            if let Some(entry) = state.keys.get_mut(&key) {
                entry.in_flight = false;
            }
            shared.changed.notify_all();
            continue;
        }

        let has_pending = state.keys.values().any(|k| k.pending.is_some());
        if state.shutdown && !has_pending {
            break;
        }

        state = match next_deadline {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(now);
                shared
                    .changed
                    .wait_timeout(state, timeout)
                    .map(|(guard, _)| guard)
                    .unwrap_or_else(|e| e.into_inner().0)
            }
            None => shared
                .changed
                .wait(state)
                .unwrap_or_else(|e| e.into_inner()),
        };
    }
}
