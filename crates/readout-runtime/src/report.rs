#![forbid(unsafe_code)]

//! What to print after the terminal frame.
//!
//! | Final status | Load  | Verbosity | Digest |
//! |--------------|-------|-----------|--------|
//! | any, `--detail` | any | Full    | no     |
//! | Error        | High  | Full      | yes    |
//! | Error        | other | Full      | no     |
//! | Success      | Low   | Quiet     | no     |
//! | other        | High  | Focused   | yes    |
//! | other        | other | Focused   | no     |
//!
//! A failed command always gets its full output. The digest groups error and
//! warning lines with [`LineClassifier::find_similar_lines`]; internal lines
//! never enter it but are printed in Full mode like any other line.

use std::io::{self, Write};

use readout_classify::LineClassifier;
use readout_core::{
    CognitiveLoad, CognitiveLoadEstimator, OutputKind, OutputLine, TaskState, TaskStatus,
};

/// How much captured output to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verbosity {
    /// Nothing beyond the terminal frame.
    Quiet,
    /// Errors, warnings, and summaries.
    Focused,
    /// Every line.
    Full,
}

/// The decision for one finished task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPlan {
    pub verbosity: Verbosity,
    pub digest: bool,
    pub load: CognitiveLoad,
}

impl ReportPlan {
    #[must_use]
    pub fn decide(status: TaskStatus, load: CognitiveLoad, detail: bool) -> Self {
        let high = load == CognitiveLoad::High;
        let (verbosity, digest) = if detail {
            (Verbosity::Full, false)
        } else {
            match status {
                TaskStatus::Error => (Verbosity::Full, high),
                TaskStatus::Success if load == CognitiveLoad::Low => (Verbosity::Quiet, false),
                _ => (Verbosity::Focused, high),
            }
        };
        Self {
            verbosity,
            digest,
            load,
        }
    }
}

fn is_focused(line: &OutputLine) -> bool {
    line.kind.is_problem() || line.kind == OutputKind::Summary || line.context.is_summary
}

/// Write the report for a finished task and return the plan used.
pub fn write_report<W: Write>(
    out: &mut W,
    task: &TaskState,
    classifier: &LineClassifier,
    estimator: &CognitiveLoadEstimator,
) -> io::Result<ReportPlan> {
    let lines = task.snapshot();
    let load = estimator.estimate(&lines).load;
    let plan = ReportPlan::decide(task.status(), load, task.context().is_detail_view);

    if plan.verbosity == Verbosity::Quiet {
        return Ok(plan);
    }
    if plan.digest {
        write_digest(out, &lines, classifier)?;
    }
    for line in &lines {
        if plan.verbosity == Verbosity::Full || is_focused(line) {
            writeln!(out, "{}", line.content)?;
        }
    }
    out.flush()?;
    Ok(plan)
}

fn write_digest<W: Write>(
    out: &mut W,
    lines: &[OutputLine],
    classifier: &LineClassifier,
) -> io::Result<()> {
    let problems: Vec<OutputLine> = lines
        .iter()
        .filter(|line| line.kind.is_problem() && !line.context.is_internal)
        .cloned()
        .collect();
    if problems.is_empty() {
        return Ok(());
    }
    let mut groups: Vec<(String, usize)> = classifier
        .find_similar_lines(&problems)
        .into_iter()
        .map(|(key, members)| (key, members.len()))
        .collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    writeln!(out, "Similar output:")?;
    for (key, count) in groups {
        let noun = if count == 1 { "line" } else { "lines" };
        writeln!(out, "  {key} ({count} {noun})")?;
    }
    writeln!(out)
}
