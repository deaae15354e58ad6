#![forbid(unsafe_code)]

//! Core: task state, classified output lines, thresholds, and cognitive load.
//!
//! Nothing in this crate talks to a terminal or a child process. It is the
//! bookkeeping shared by the classifier (`readout-classify`) and the live
//! renderer (`readout-runtime`).

pub mod cognitive_load;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod logging;
pub mod output;
pub mod task_state;

pub use cognitive_load::{CognitiveLoadContext, CognitiveLoadEstimator};
pub use config::{
    CategoryPatterns, CognitiveLoadConfig, Config, IntentRule, PatternConfig, PatternSpec,
    SpinnerConfig, Thresholds, ToolConfig,
};
pub use error::ConfigError;
pub use output::{CognitiveLoad, LineContext, OutputKind, OutputLine};
pub use task_state::{TaskContext, TaskState, TaskStatus, TaskView};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
