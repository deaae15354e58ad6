#![forbid(unsafe_code)]

//! SIGINT/SIGTERM handling.
//!
//! While a [`SignalGuard`] is alive, either signal fires the given
//! [`StopTrigger`] instead of terminating the process. The spinner then stops
//! within one tick and the runner asks the child to finish, so the terminal
//! frame is still written and the cursor restored.

use std::io;
use std::thread::JoinHandle;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use crate::stop_signal::StopTrigger;

#[derive(Debug)]
pub struct SignalGuard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalGuard {
    /// Route SIGINT and SIGTERM to `trigger`.
    pub fn install(trigger: StopTrigger) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGINT | SIGTERM => {
                        tracing::warn!(signal, "termination signal received, stopping");
                        trigger.stop();
                    }
                    _ => {}
                }
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop_signal::StopSignal;
    use std::time::Duration;

    #[test]
    fn sigterm_fires_trigger() {
        let (signal, trigger) = StopSignal::new();
        let guard = SignalGuard::install(trigger).unwrap();
        signal_hook::low_level::raise(SIGTERM).unwrap();
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        drop(guard);
    }
}
