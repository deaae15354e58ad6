#![forbid(unsafe_code)]

//! Cancellation pair.
//!
//! A [`StopSignal`] is the waiting side (spinner ticker, runner wait loop);
//! a [`StopTrigger`] is the firing side (signal handler, tests). Both are
//! cheap clones of one `Arc<(Mutex<bool>, Condvar)>`. Once fired the signal
//! stays fired.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

type Inner = Arc<(Mutex<bool>, Condvar)>;

fn lock(inner: &Inner) -> MutexGuard<'_, bool> {
    inner.0.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Waiting side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Inner,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    #[must_use]
    pub fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: Arc::clone(&inner),
        };
        (signal, StopTrigger { inner })
    }

    /// A signal that no trigger can fire.
    #[must_use]
    pub fn never() -> Self {
        Self::new().0
    }

    /// Check if the stop signal has been triggered.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *lock(&self.inner)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out. Spurious wakeups
    /// resume waiting for the remainder of `duration`.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (_, cvar) = &*self.inner;
        let mut stopped = lock(&self.inner);
        if *stopped {
            return true;
        }

        let start = Instant::now();
        let mut remaining = duration;

        loop {
            let (guard, result) = cvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
            if *stopped {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

/// Firing side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct StopTrigger {
    inner: Inner,
}

impl StopTrigger {
    /// Fire the signal and wake every waiter.
    pub fn stop(&self) {
        let (_, cvar) = &*self.inner;
        let mut stopped = lock(&self.inner);
        *stopped = true;
        cvar.notify_all();
    }

    /// A new waiting handle on the same pair.
    #[must_use]
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_unstopped() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.is_stopped());
    }

    #[test]
    fn trigger_stops_every_clone() {
        let (signal, trigger) = StopSignal::new();
        let other = signal.clone();
        let from_trigger = trigger.signal();
        trigger.stop();
        assert!(signal.is_stopped());
        assert!(other.is_stopped());
        assert!(from_trigger.is_stopped());
    }

    #[test]
    fn wait_timeout_times_out() {
        let (signal, _trigger) = StopSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wait_timeout_returns_immediately_when_stopped() {
        let (signal, trigger) = StopSignal::new();
        trigger.stop();
        let start = Instant::now();
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wait_timeout_wakes_on_stop() {
        let (signal, trigger) = StopSignal::new();
        let waiter = thread::spawn(move || {
            let start = Instant::now();
            let stopped = signal.wait_timeout(Duration::from_secs(5));
            (stopped, start.elapsed())
        });
        thread::sleep(Duration::from_millis(10));
        trigger.stop();
        let (stopped, elapsed) = waiter.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn never_never_fires() {
        assert!(!StopSignal::never().wait_timeout(Duration::from_millis(5)));
    }
}
