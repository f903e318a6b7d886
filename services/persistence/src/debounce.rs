//! Debounced flush scheduling
//!
//! One flusher owns one persisted artifact. Mutations mark the artifact
//! dirty; a background worker waits out a quiet interval and then runs the
//! write closure once, so a burst of updates collapses into at most one
//! pending write. `flush` runs the write synchronously on the caller's
//! thread, and dropping the flusher drains any pending write before the
//! worker exits.
//!
//! A failed write never blocks the in-memory state: the fault is logged and
//! retained for inspection, and the next mark schedules another attempt.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Outcome of one write attempt.
pub type FlushResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

struct State {
    dirty: bool,
    shutdown: bool,
    last_error: Option<String>,
}

struct Shared {
    label: &'static str,
    interval: Duration,
    write: Box<dyn Fn() -> FlushResult + Send + Sync>,
    state: Mutex<State>,
    wake: Condvar,
    // Serializes write attempts between the worker and synchronous flushes.
    write_serial: Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn run_write(&self) {
        let _serial = lock(&self.write_serial);
        match (self.write)() {
            Ok(()) => {
                lock(&self.state).last_error = None;
                debug!(artifact = self.label, "flush completed");
            }
            Err(err) => {
                error!(artifact = self.label, error = %err, "flush failed");
                lock(&self.state).last_error = Some(err.to_string());
            }
        }
    }
}

/// Background writer that coalesces dirty marks into debounced flushes.
pub struct DebouncedFlusher {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl DebouncedFlusher {
    /// Start a flusher for one artifact.
    ///
    /// `write` must serialize the current in-memory state; it runs on the
    /// worker thread and, for synchronous flushes, on the caller's thread.
    pub fn spawn(
        label: &'static str,
        interval: Duration,
        write: impl Fn() -> FlushResult + Send + Sync + 'static,
    ) -> Self {
        let shared = Arc::new(Shared {
            label,
            interval,
            write: Box::new(write),
            state: Mutex::new(State {
                dirty: false,
                shutdown: false,
                last_error: None,
            }),
            wake: Condvar::new(),
            write_serial: Mutex::new(()),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_loop(&worker_shared));

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Record that the artifact changed and schedule a flush.
    pub fn mark_dirty(&self) {
        lock(&self.shared.state).dirty = true;
        self.shared.wake.notify_one();
    }

    /// Write any pending change now, on the calling thread.
    pub fn flush(&self) {
        let was_dirty = {
            let mut state = lock(&self.shared.state);
            std::mem::replace(&mut state.dirty, false)
        };
        if was_dirty {
            self.shared.run_write();
        }
    }

    /// Message of the most recent failed write, if the last attempt failed.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.state).last_error.clone()
    }
}

impl Drop for DebouncedFlusher {
    fn drop(&mut self) {
        lock(&self.shared.state).shutdown = true;
        self.shared.wake.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        // Wait for a change or shutdown.
        let mut state = lock(&shared.state);
        while !state.dirty && !state.shutdown {
            state = shared
                .wake
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if !state.dirty {
            return; // shutdown with nothing pending
        }

        // Quiet window measured from the first change. Marks landing inside
        // it coalesce onto the same flag; shutdown cuts the window short so
        // drop drains promptly.
        if !state.shutdown {
            let deadline = Instant::now() + shared.interval;
            while !state.shutdown {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                let (guard, _timed_out) = shared
                    .wake
                    .wait_timeout(state, deadline - now)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                state = guard;
            }
        }

        // A synchronous flush may have raced us and already written.
        let do_write = std::mem::replace(&mut state.dirty, false);
        let final_pass = state.shutdown;
        drop(state);

        if do_write {
            shared.run_write();
        }
        if final_pass {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_flusher(interval: Duration) -> (DebouncedFlusher, Arc<AtomicUsize>) {
        let writes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&writes);
        let flusher = DebouncedFlusher::spawn("test", interval, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (flusher, writes)
    }

    fn wait_until(condition: impl Fn() -> bool, what: &str) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_burst_collapses_into_one_write() {
        let (flusher, writes) = counting_flusher(Duration::from_millis(30));

        for _ in 0..10 {
            flusher.mark_dirty();
        }
        wait_until(|| writes.load(Ordering::SeqCst) >= 1, "first flush");
        // Give the worker a chance to (incorrectly) write again.
        thread::sleep(Duration::from_millis(80));
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_flush_is_synchronous() {
        let (flusher, writes) = counting_flusher(Duration::from_secs(60));

        flusher.mark_dirty();
        flusher.flush();
        assert!(writes.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_flush_without_changes_is_a_noop() {
        let (flusher, writes) = counting_flusher(Duration::from_millis(10));
        flusher.flush();
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_drains_pending_write() {
        let (flusher, writes) = counting_flusher(Duration::from_secs(60));
        flusher.mark_dirty();
        drop(flusher);
        assert!(writes.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_failed_write_is_retained_and_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let flusher = DebouncedFlusher::spawn("failing", Duration::from_millis(10), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("disk full".into())
            } else {
                Ok(())
            }
        });

        flusher.mark_dirty();
        wait_until(|| flusher.last_error().is_some(), "failed write");
        assert_eq!(flusher.last_error(), Some("disk full".to_string()));

        // The next change schedules another attempt, which succeeds.
        flusher.mark_dirty();
        wait_until(|| flusher.last_error().is_none(), "recovery");
        assert!(attempts.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_writes_after_flush_still_scheduled() {
        let (flusher, writes) = counting_flusher(Duration::from_millis(10));

        flusher.mark_dirty();
        flusher.flush();
        let after_first = writes.load(Ordering::SeqCst);

        flusher.mark_dirty();
        wait_until(
            || writes.load(Ordering::SeqCst) > after_first,
            "debounced write",
        );
    }
}
