#![forbid(unsafe_code)]

//! Two-phase line classifier.
//!
//! # Phases
//!
//! 1. **Fast path**: fixed prefixes (see [`fast_path`](crate::fast_path)).
//!    A hit returns immediately with that prefix's fixed context.
//! 2. **Scored path**: every applicable regex votes for its category with its
//!    weight: `"tool subcommand"` patterns, then `"tool"` patterns, then the
//!    global table. Two structural signals vote in the same score space:
//!    - a `file:line` token adds 3 to Error,
//!    - a leading `PASS` / `FAIL` token adds 5 to Success / Error.
//!
//! # Winner selection
//!
//! The highest score wins. If every category scored the same (including the
//! all-zero case) the line is `Detail` with importance 2. Ties between some
//! but not all categories resolve by the fixed order
//! Error > Warning > Success > Info > Progress > Summary > Detail.
//!
//! # Determinism
//!
//! The classifier holds no mutable state: the same `(line, command, args)`
//! always yields the same result.

use std::collections::HashMap;

use regex::Regex;
use readout_core::{CognitiveLoad, Config, LineContext, OutputKind, PatternConfig};

use crate::fast_path;
use crate::intent::{IntentTable, tool_keys};
use crate::patterns::{KIND_COUNT, PatternSet, add_score};

/// Score added to Error for a `file:line` token.
pub const FILE_LINE_SCORE: u32 = 3;
/// Score added to Success/Error for a leading PASS/FAIL token.
pub const PASS_FAIL_SCORE: u32 = 5;

const FILE_LINE_PATTERN: &str =
    r"(?:^|[^\w:/.\\-])([\w./\\-]*[\w-]\.[A-Za-z]\w*):(\d+)\b";
const PASS_FAIL_PATTERN: &str = r"^\s*(?:---\s+)?(PASS|FAIL)\b";

/// Structural signals found while scoring.
#[derive(Debug, Clone, Copy, Default)]
struct Signals {
    file_line: bool,
    pass: bool,
    fail: bool,
}

/// Classifier with an owned, compiled dictionary.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    intents: IntentTable,
    tools: HashMap<String, PatternSet>,
    global: PatternSet,
    file_line: Regex,
    pass_fail: Regex,
    skipped: usize,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(&PatternConfig::default())
    }
}

impl LineClassifier {
    /// Compile a classifier from a pattern dictionary. Invalid regexes are
    /// skipped (see [`LineClassifier::skipped_patterns`]).
    #[must_use]
    pub fn new(config: &PatternConfig) -> Self {
        let mut skipped = 0;
        let (global, n) = PatternSet::compile(&config.output, "global");
        skipped += n;

        let mut tools = HashMap::with_capacity(config.tools.len());
        for (key, tool) in &config.tools {
            let (set, n) = PatternSet::compile(&tool.patterns, key);
            skipped += n;
            if !set.is_empty() {
                tools.insert(key.clone(), set);
            }
        }

        Self {
            intents: IntentTable::from_config(config),
            tools,
            global,
            file_line: structural(FILE_LINE_PATTERN),
            pass_fail: structural(PASS_FAIL_PATTERN),
            skipped,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.patterns)
    }

    /// Number of dictionary patterns dropped because they failed to compile.
    #[must_use]
    pub fn skipped_patterns(&self) -> usize {
        self.skipped
    }

    /// What the command is doing, e.g. `"building"` or `"testing"`.
    #[must_use]
    pub fn detect_command_intent<S: AsRef<str>>(&self, command: &str, args: &[S]) -> String {
        self.intents.detect(command, args)
    }

    /// Classify one raw output line (no trailing newline).
    #[must_use]
    pub fn classify_output_line<S: AsRef<str>>(
        &self,
        line: &str,
        command: &str,
        args: &[S],
    ) -> (OutputKind, LineContext) {
        if let Some(hit) = fast_path::classify(line) {
            return hit;
        }

        let mut scores = [0u32; KIND_COUNT];
        for key in tool_keys(command, args) {
            if let Some(set) = self.tools.get(&key) {
                set.score_into(line, &mut scores);
            }
        }
        self.global.score_into(line, &mut scores);

        let mut signals = Signals::default();
        if self.file_line.is_match(line) {
            signals.file_line = true;
            add_score(&mut scores, OutputKind::Error, FILE_LINE_SCORE);
        }
        if let Some(caps) = self.pass_fail.captures(line) {
            if &caps[1] == "PASS" {
                signals.pass = true;
                add_score(&mut scores, OutputKind::Success, PASS_FAIL_SCORE);
            } else {
                signals.fail = true;
                add_score(&mut scores, OutputKind::Error, PASS_FAIL_SCORE);
            }
        }

        let kind = winner(&scores);
        (kind, scored_context(kind, signals))
    }

    /// The `file:line` token in `line`, if any (e.g. `"main.go:42"`).
    #[must_use]
    pub fn file_line_token(&self, line: &str) -> Option<String> {
        self.file_line
            .captures(line)
            .map(|caps| format!("{}:{}", &caps[1], &caps[2]))
    }
}

fn structural(pattern: &str) -> Regex {
    // Constant patterns, exercised by the unit tests below.
    Regex::new(pattern).unwrap_or_else(|err| panic!("built-in pattern {pattern:?}: {err}"))
}

fn winner(scores: &[u32; KIND_COUNT]) -> OutputKind {
    let max = scores.iter().copied().max().unwrap_or(0);
    if max == 0 || scores.iter().all(|&s| s == max) {
        return OutputKind::Detail;
    }
    OutputKind::ALL
        .into_iter()
        .find(|kind| scores[kind.index()] == max)
        .unwrap_or(OutputKind::Detail)
}

fn scored_context(kind: OutputKind, signals: Signals) -> LineContext {
    match kind {
        OutputKind::Error if signals.fail => LineContext::new(5, CognitiveLoad::High).highlighted(),
        OutputKind::Error => LineContext::new(4, CognitiveLoad::High).highlighted(),
        OutputKind::Warning => LineContext::new(3, CognitiveLoad::Medium),
        OutputKind::Success => LineContext::new(3, CognitiveLoad::Low),
        OutputKind::Info => LineContext::new(2, CognitiveLoad::Low),
        OutputKind::Progress => LineContext::new(1, CognitiveLoad::Low),
        OutputKind::Summary => LineContext::new(4, CognitiveLoad::Medium).summary(),
        OutputKind::Detail => LineContext::default(),
    }
}
