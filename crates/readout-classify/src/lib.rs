#![forbid(unsafe_code)]

//! Heuristic classification of command output.
//!
//! # Key Components
//!
//! - [`LineClassifier`] - owns the compiled pattern dictionary; detects a
//!   command's intent, classifies lines, and groups similar lines
//! - [`fast_path`] - fixed prefix sets checked before any regex runs
//! - [`PatternSet`] - compiled, weighted regexes for one scope (a tool or the
//!   global table)
//!
//! A classifier is immutable after construction. Reconfiguring means building
//! a new one; share it across reader threads as `Arc<LineClassifier>`.

pub mod classifier;
pub mod fast_path;
pub mod intent;
pub mod patterns;
pub mod similar;

pub use classifier::LineClassifier;
pub use patterns::{CompiledPattern, PatternSet};
