#![forbid(unsafe_code)]

//! Classified output lines.
//!
//! An [`OutputLine`] is one line of a wrapped command's stdout or stderr after
//! classification: the raw text, its [`OutputKind`], the time it arrived, its
//! indentation level, and the per-line [`LineContext`] the classifier derived.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Semantic category of an output line.
///
/// The declaration order is the tie-break priority used by the scored
/// classifier (earlier wins), with `Detail` as the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Error,
    Warning,
    Success,
    Info,
    Progress,
    Summary,
    Detail,
}

impl OutputKind {
    /// Every kind, in tie-break priority order.
    pub const ALL: [OutputKind; 7] = [
        OutputKind::Error,
        OutputKind::Warning,
        OutputKind::Success,
        OutputKind::Info,
        OutputKind::Progress,
        OutputKind::Summary,
        OutputKind::Detail,
    ];

    /// Stable index into [`OutputKind::ALL`], for score tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Error => 0,
            Self::Warning => 1,
            Self::Success => 2,
            Self::Info => 3,
            Self::Progress => 4,
            Self::Summary => 5,
            Self::Detail => 6,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Info => "info",
            Self::Progress => "progress",
            Self::Summary => "summary",
            Self::Detail => "detail",
        }
    }

    /// Error or warning: the kinds that feed the task's incremental counters.
    #[must_use]
    pub const fn is_problem(self) -> bool {
        matches!(self, Self::Error | Self::Warning)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much attention output demands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveLoad {
    #[default]
    Low,
    Medium,
    High,
}

impl CognitiveLoad {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for CognitiveLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-line metadata produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineContext {
    pub cognitive_load: CognitiveLoad,
    /// 1 (ignorable) through 5 (must read).
    pub importance: u8,
    pub is_highlighted: bool,
    pub is_summary: bool,
    /// Generated by readout itself (e.g. "failed to start process"), not by
    /// the wrapped command. Summaries filter on this flag.
    pub is_internal: bool,
}

impl LineContext {
    /// Lowest importance a line can carry.
    pub const MIN_IMPORTANCE: u8 = 1;
    /// Highest importance a line can carry.
    pub const MAX_IMPORTANCE: u8 = 5;

    /// Context with the given importance (clamped to 1..=5) and load.
    #[must_use]
    pub fn new(importance: u8, cognitive_load: CognitiveLoad) -> Self {
        Self {
            cognitive_load,
            importance: importance.clamp(Self::MIN_IMPORTANCE, Self::MAX_IMPORTANCE),
            is_highlighted: false,
            is_summary: false,
            is_internal: false,
        }
    }

    #[must_use]
    pub fn highlighted(mut self) -> Self {
        self.is_highlighted = true;
        self
    }

    #[must_use]
    pub fn summary(mut self) -> Self {
        self.is_summary = true;
        self
    }

    #[must_use]
    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }
}

impl Default for LineContext {
    fn default() -> Self {
        Self::new(2, CognitiveLoad::Low)
    }
}

/// One classified line of captured output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLine {
    pub content: String,
    pub kind: OutputKind,
    pub timestamp: SystemTime,
    pub indentation: usize,
    pub context: LineContext,
}

impl OutputLine {
    /// Build a line stamped with the current time.
    #[must_use]
    pub fn new(content: impl Into<String>, kind: OutputKind, context: LineContext) -> Self {
        let content = content.into();
        let indentation = indentation_level(&content);
        Self {
            content,
            kind,
            timestamp: SystemTime::now(),
            indentation,
            context,
        }
    }

    /// The content with surrounding whitespace removed.
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.trim()
    }
}

/// Indentation level from leading whitespace: two columns per level, tabs
/// count as four columns.
#[must_use]
pub fn indentation_level(content: &str) -> usize {
    let columns: usize = content
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum();
    columns / 2
}
