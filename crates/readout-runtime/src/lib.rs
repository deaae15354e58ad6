#![forbid(unsafe_code)]

//! Runtime for readout: everything that touches a terminal or a child process.
//!
//! # Key Components
//!
//! - [`StopSignal`] / [`StopTrigger`] - cancellation pair shared by the
//!   spinner ticker, the runner's wait loop, and signal handling
//! - [`DisplayMode`] - interactive ANSI frames vs. plain CI lines
//! - [`LiveProgress`] - the `{Inactive, Active}` spinner state machine
//! - [`CommandRunner`] - spawns the command, classifies both streams into a
//!   [`TaskState`](readout_core::TaskState)
//! - [`report`] - what to print once the command has finished

pub mod live_progress;
pub mod report;
pub mod runner;
#[cfg(unix)]
pub mod signals;
pub mod stop_signal;
pub mod terminal;

pub use live_progress::{LiveProgress, ProgressOutcome, format_elapsed};
pub use report::{ReportPlan, Verbosity, write_report};
pub use runner::{CommandRunner, RunRequest};
#[cfg(unix)]
pub use signals::SignalGuard;
pub use stop_signal::{StopSignal, StopTrigger};
pub use terminal::DisplayMode;
