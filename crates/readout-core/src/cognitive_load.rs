#![forbid(unsafe_code)]

//! Cognitive-load estimation over an arbitrary batch of lines.
//!
//! [`TaskState::update_context`](crate::TaskState::update_context) derives
//! load for the whole task. The estimator applies the same threshold table to
//! any subset a renderer picks (last screen, errors only, the entire run)
//! without touching task state.

use crate::config::{CognitiveLoadConfig, Thresholds};
use crate::output::{CognitiveLoad, OutputKind, OutputLine};

/// Result of one estimation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CognitiveLoadContext {
    pub load: CognitiveLoad,
    /// 1..=5; zero lines still count as complexity 2 when auto-detecting.
    pub complexity: u8,
    pub error_count: usize,
    pub warning_count: usize,
    pub line_count: usize,
}

/// Pure load estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CognitiveLoadEstimator {
    thresholds: Thresholds,
    config: CognitiveLoadConfig,
}

impl CognitiveLoadEstimator {
    #[must_use]
    pub fn new(thresholds: Thresholds, config: CognitiveLoadConfig) -> Self {
        Self { thresholds, config }
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Estimate load for `lines`.
    ///
    /// With auto-detection disabled the configured default load is returned
    /// regardless of content; counts are still reported.
    #[must_use]
    pub fn estimate(&self, lines: &[OutputLine]) -> CognitiveLoadContext {
        let (error_count, warning_count) =
            lines
                .iter()
                .fold((0, 0), |(errors, warnings), line| match line.kind {
                    OutputKind::Error => (errors + 1, warnings),
                    OutputKind::Warning => (errors, warnings + 1),
                    _ => (errors, warnings),
                });
        let line_count = lines.len();
        let complexity = self.thresholds.complexity_for(line_count);

        let load = if self.config.auto_detect {
            self.thresholds
                .load_for(error_count, warning_count, complexity)
        } else {
            self.config.default
        };

        CognitiveLoadContext {
            load,
            complexity,
            error_count,
            warning_count,
            line_count,
        }
    }
}
