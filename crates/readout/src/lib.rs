#![forbid(unsafe_code)]

//! readout: run a command, classify its output line by line, and show live
//! progress that adapts to how much attention the output demands.
//!
//! # Crates
//!
//! - `readout-core` - task state, output lines, thresholds, config
//! - `readout-classify` - intent detection and line classification
//! - `readout-runtime` - live progress, child-process capture, reports
//!
//! # Example
//!
//! ```no_run
//! use readout::prelude::*;
//!
//! let runner = CommandRunner::from_config(Config::default().apply_env());
//! let task = runner.run(RunRequest::new("cargo", ["build"]));
//! assert!(task.is_complete());
//! ```

pub mod app;
pub mod cli;
pub mod error;

pub use error::{Error, Result};

pub use readout_classify::LineClassifier;
pub use readout_core::{
    CognitiveLoad, CognitiveLoadContext, CognitiveLoadEstimator, Config, ConfigError, LineContext,
    OutputKind, OutputLine, TaskContext, TaskState, TaskStatus,
};
pub use readout_runtime::{
    CommandRunner, DisplayMode, LiveProgress, ProgressOutcome, ReportPlan, RunRequest, StopSignal,
    StopTrigger, Verbosity, write_report,
};

pub mod prelude {
    //! Everything needed to wrap a command.

    pub use crate::{
        CognitiveLoad, CommandRunner, Config, DisplayMode, Error, LineClassifier, LineContext,
        LiveProgress, OutputKind, OutputLine, ProgressOutcome, Result, RunRequest, StopSignal,
        TaskState, TaskStatus,
    };
}
