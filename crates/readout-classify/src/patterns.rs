#![forbid(unsafe_code)]

//! Compiled, weighted category patterns.
//!
//! A malformed regex in the dictionary is skipped with a warning; construction
//! never fails.

use regex::Regex;
use readout_core::{CategoryPatterns, OutputKind};

/// Number of categories a score table tracks.
pub const KIND_COUNT: usize = OutputKind::ALL.len();

/// One compiled regex voting for `kind` with `weight`.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub kind: OutputKind,
    pub weight: u32,
}

/// Compiled patterns for one scope, in dictionary order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compile `groups`, returning the set and the number of patterns skipped.
    ///
    /// `scope` names the table (`"global"` or a tool key) in log output.
    #[must_use]
    pub fn compile(groups: &[CategoryPatterns], scope: &str) -> (Self, usize) {
        let mut patterns = Vec::new();
        let mut skipped = 0;
        for group in groups {
            for spec in &group.patterns {
                match Regex::new(spec.pattern()) {
                    Ok(regex) => patterns.push(CompiledPattern {
                        regex,
                        kind: group.kind,
                        weight: spec.weight(),
                    }),
                    Err(err) => {
                        skipped += 1;
                        tracing::warn!(
                            scope,
                            kind = %group.kind,
                            pattern = spec.pattern(),
                            error = %err,
                            "skipping invalid output pattern"
                        );
                    }
                }
            }
        }
        tracing::debug!(scope, compiled = patterns.len(), skipped, "compiled pattern set");
        (Self { patterns }, skipped)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }

    /// Add every matching pattern's weight to its category's score.
    ///
    /// Scores saturate at `u32::MAX`.
    pub fn score_into(&self, line: &str, scores: &mut [u32; KIND_COUNT]) {
        for pattern in &self.patterns {
            if pattern.regex.is_match(line) {
                add_score(scores, pattern.kind, pattern.weight);
            }
        }
    }
}

/// Saturating vote for `kind`.
pub fn add_score(scores: &mut [u32; KIND_COUNT], kind: OutputKind, weight: u32) {
    let slot = &mut scores[kind.index()];
    *slot = slot.saturating_add(weight);
}
