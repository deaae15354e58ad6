#![forbid(unsafe_code)]

//! Concurrency-safe record of one wrapped command.
//!
//! A [`TaskState`] is created when the command starts, fed classified lines
//! by one writer thread per captured stream, read by the renderer, and
//! finalized exactly once by [`TaskState::complete`].
//!
//! # Invariants
//!
//! 1. **One lock**: the line list, the error/warning counters, the status and
//!    the context live behind a single mutex, so `add_output_line` and
//!    `update_context` are atomic with respect to each other.
//! 2. **Counter consistency**: at every observation point the counters equal
//!    a rescan of the line list.
//! 3. **Absorbing completion**: once `complete` has run, the status, exit
//!    code and end time never change again.
//! 4. **No leaked lock**: callers get [`TaskState::snapshot`] or a scoped
//!    [`TaskState::with_lock`]; the guard itself never escapes.
//!
//! # Status precedence
//!
//! | exit code | error lines | warning lines | status |
//! |-----------|-------------|---------------|--------|
//! | non-zero  | any         | any           | Error  |
//! | 0         | > 0         | any           | Error  |
//! | 0         | 0           | > 0           | Warning|
//! | 0         | 0           | 0             | Success|

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use crate::config::Thresholds;
use crate::output::{CognitiveLoad, LineContext, OutputKind, OutputLine};

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Running,
    Success,
    Warning,
    Error,
}

impl TaskStatus {
    /// Final status from the exit code and accumulated problem counts.
    #[must_use]
    pub const fn derive(exit_code: i32, errors: usize, warnings: usize) -> Self {
        if exit_code != 0 || errors > 0 {
            Self::Error
        } else if warnings > 0 {
            Self::Warning
        } else {
            Self::Success
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived, task-level presentation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskContext {
    pub cognitive_load: CognitiveLoad,
    /// 1..=5.
    pub complexity: u8,
    pub is_detail_view: bool,
}

impl Default for TaskContext {
    fn default() -> Self {
        Self {
            cognitive_load: CognitiveLoad::Low,
            complexity: 1,
            is_detail_view: false,
        }
    }
}

/// The lock-protected part of a task, as seen inside [`TaskState::with_lock`].
#[derive(Debug, Clone)]
pub struct TaskView {
    lines: Vec<OutputLine>,
    error_count: usize,
    warning_count: usize,
    status: TaskStatus,
    exit_code: Option<i32>,
    end_time: Option<SystemTime>,
    duration: Option<Duration>,
    context: TaskContext,
}

impl TaskView {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            error_count: 0,
            warning_count: 0,
            status: TaskStatus::Running,
            exit_code: None,
            end_time: None,
            duration: None,
            context: TaskContext::default(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    #[must_use]
    pub fn end_time(&self) -> Option<SystemTime> {
        self.end_time
    }

    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    #[must_use]
    pub fn context(&self) -> TaskContext {
        self.context
    }

    fn push(&mut self, line: OutputLine) {
        match line.kind {
            OutputKind::Error => self.error_count += 1,
            OutputKind::Warning => self.warning_count += 1,
            _ => {}
        }
        self.lines.push(line);
    }

    fn refresh_context(&mut self, thresholds: &Thresholds) {
        let complexity = thresholds.complexity_for(self.lines.len());
        self.context.complexity = complexity;
        self.context.cognitive_load =
            thresholds.load_for(self.error_count, self.warning_count, complexity);
    }
}

/// One running (or finished) command and its captured output.
///
/// Share it as `Arc<TaskState>`: every method takes `&self`.
#[derive(Debug)]
pub struct TaskState {
    label: String,
    intent: String,
    command: String,
    args: Vec<String>,
    start_time: SystemTime,
    started: Instant,
    thresholds: Thresholds,
    inner: Mutex<TaskView>,
}

impl TaskState {
    /// Start tracking a command with default thresholds.
    pub fn new(
        label: impl Into<String>,
        intent: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self::with_thresholds(label, intent, command, args, Thresholds::default())
    }

    /// Start tracking a command with explicit thresholds.
    pub fn with_thresholds(
        label: impl Into<String>,
        intent: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            label: label.into(),
            intent: intent.into(),
            command: command.into(),
            args,
            start_time: SystemTime::now(),
            started: Instant::now(),
            thresholds,
            inner: Mutex::new(TaskView::new()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn intent(&self) -> &str {
        &self.intent
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    // A writer that panicked mid-push cannot leave the view half-updated
    // (push is a counter bump then a Vec push), so a poisoned lock is safe
    // to keep using.
    fn lock(&self) -> MutexGuard<'_, TaskView> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a classified line. Classification must already be done; only
    /// the push and counter bump happen under the lock.
    pub fn add_output_line(
        &self,
        content: impl Into<String>,
        kind: OutputKind,
        context: LineContext,
    ) {
        self.add_line(OutputLine::new(content, kind, context));
    }

    /// Append an already-built line.
    pub fn add_line(&self, line: OutputLine) {
        self.lock().push(line);
    }

    /// Recompute complexity and cognitive load from the current counts.
    pub fn update_context(&self) {
        let thresholds = self.thresholds;
        self.lock().refresh_context(&thresholds);
    }

    /// Toggle the detail view flag consumed by the renderer.
    pub fn set_detail_view(&self, enabled: bool) {
        self.lock().context.is_detail_view = enabled;
    }

    /// Finalize the task and return its status.
    ///
    /// Only the first call has any effect; later calls return the status the
    /// first call settled on.
    pub fn complete(&self, exit_code: i32) -> TaskStatus {
        let thresholds = self.thresholds;
        let mut view = self.lock();
        if view.status.is_terminal() {
            crate::warn!(
                label = %self.label,
                exit_code,
                "complete called on a finished task; ignoring"
            );
            return view.status;
        }
        let duration = self.started.elapsed();
        view.end_time = Some(self.start_time + duration);
        view.duration = Some(duration);
        view.exit_code = Some(exit_code);
        view.status = TaskStatus::derive(exit_code, view.error_count, view.warning_count);
        view.refresh_context(&thresholds);
        crate::debug!(
            label = %self.label,
            exit_code,
            status = %view.status,
            lines = view.lines.len(),
            "task completed"
        );
        view.status
    }

    /// Independent copy of the lines, for rendering without holding the lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<OutputLine> {
        self.lock().lines.clone()
    }

    /// Run `f` with read access to the locked view.
    ///
    /// Keep `f` short: writers block for as long as it runs.
    pub fn with_lock<R>(&self, f: impl FnOnce(&TaskView) -> R) -> R {
        f(&self.lock())
    }

    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.lock().status
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status().is_terminal()
    }

    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.lock().exit_code
    }

    #[must_use]
    pub fn end_time(&self) -> Option<SystemTime> {
        self.lock().end_time
    }

    /// Final duration once complete, `None` while running.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.lock().duration
    }

    /// Final duration once complete, otherwise time since start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.duration().unwrap_or_else(|| self.started.elapsed())
    }

    #[must_use]
    pub fn context(&self) -> TaskContext {
        self.lock().context
    }

    /// `(errors, warnings)` from the incremental counters.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        let view = self.lock();
        (view.error_count, view.warning_count)
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lock().lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn task() -> TaskState {
        TaskState::new("Build", "building", "go", vec!["build".to_string()])
    }

    fn add(task: &TaskState, kind: OutputKind) {
        task.add_output_line(format!("{kind} line"), kind, LineContext::default());
    }

    #[test]
    fn new_task_is_running() {
        let t = task();
        assert_eq!(t.status(), TaskStatus::Running);
        assert_eq!(t.exit_code(), None);
        assert_eq!(t.duration(), None);
        assert_eq!(t.end_time(), None);
        assert_eq!(t.line_count(), 0);
        assert_eq!(t.label(), "Build");
        assert_eq!(t.intent(), "building");
        assert_eq!(t.command(), "go");
        assert_eq!(t.args(), ["build"]);
    }

    #[test]
    fn counters_track_problem_lines() {
        let t = task();
        add(&t, OutputKind::Error);
        add(&t, OutputKind::Warning);
        add(&t, OutputKind::Warning);
        add(&t, OutputKind::Detail);
        add(&t, OutputKind::Success);
        assert_eq!(t.counts(), (1, 2));
        assert_eq!(t.line_count(), 5);
    }

    #[test]
    fn status_precedence_grid() {
        let cases = [
            (1, 0, 0, TaskStatus::Error),
            (1, 1, 1, TaskStatus::Error),
            (2, 0, 1, TaskStatus::Error),
            (0, 1, 0, TaskStatus::Error),
            (0, 1, 3, TaskStatus::Error),
            (0, 0, 1, TaskStatus::Warning),
            (0, 0, 0, TaskStatus::Success),
        ];
        for (code, errors, warnings, expected) in cases {
            let t = task();
            for _ in 0..errors {
                add(&t, OutputKind::Error);
            }
            for _ in 0..warnings {
                add(&t, OutputKind::Warning);
            }
            assert_eq!(
                t.complete(code),
                expected,
                "code={code} errors={errors} warnings={warnings}"
            );
        }
    }

    #[test]
    fn zero_exit_does_not_hide_error_lines() {
        let t = task();
        add(&t, OutputKind::Error);
        assert_eq!(t.complete(0), TaskStatus::Error);
        assert_eq!(t.exit_code(), Some(0));
    }

    #[test]
    fn complete_sets_timing() {
        let t = task();
        t.complete(0);
        let duration = t.duration().expect("duration set");
        let end = t.end_time().expect("end time set");
        assert_eq!(end, t.start_time() + duration);
        assert_eq!(t.elapsed(), duration);
    }

    #[test]
    fn complete_is_absorbing() {
        let t = task();
        assert_eq!(t.complete(0), TaskStatus::Success);
        add(&t, OutputKind::Error);
        assert_eq!(t.complete(3), TaskStatus::Success);
        assert_eq!(t.exit_code(), Some(0));
        assert_eq!(t.status(), TaskStatus::Success);
    }

    #[test]
    fn update_context_size_alone_drives_high_load() {
        let t = task();
        for _ in 0..150 {
            add(&t, OutputKind::Detail);
        }
        t.update_context();
        let ctx = t.context();
        assert_eq!(ctx.complexity, 5);
        assert_eq!(ctx.cognitive_load, CognitiveLoad::High);
    }

    #[test]
    fn update_context_tiers() {
        let t = task();
        t.update_context();
        assert_eq!(t.context().complexity, 2);
        assert_eq!(t.context().cognitive_load, CognitiveLoad::Low);

        for _ in 0..21 {
            add(&t, OutputKind::Detail);
        }
        t.update_context();
        assert_eq!(t.context().complexity, 3);
        assert_eq!(t.context().cognitive_load, CognitiveLoad::Medium);
    }

    #[test]
    fn update_context_error_counts() {
        let t = task();
        add(&t, OutputKind::Error);
        t.update_context();
        assert_eq!(t.context().cognitive_load, CognitiveLoad::Medium);
        for _ in 0..5 {
            add(&t, OutputKind::Error);
        }
        t.update_context();
        assert_eq!(t.context().cognitive_load, CognitiveLoad::High);
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let thresholds = Thresholds {
            complexity_very_high: 4,
            complexity_high: 3,
            complexity_medium: 2,
            error_high: 0,
            warning_medium: 0,
        };
        let t = TaskState::with_thresholds("x", "running", "x", Vec::new(), thresholds);
        for _ in 0..5 {
            add(&t, OutputKind::Detail);
        }
        t.update_context();
        assert_eq!(t.context().complexity, 5);
    }

    #[test]
    fn detail_view_survives_context_refresh() {
        let t = task();
        t.set_detail_view(true);
        t.update_context();
        t.complete(0);
        assert!(t.context().is_detail_view);
    }

    #[test]
    fn snapshot_is_independent() {
        let t = task();
        add(&t, OutputKind::Info);
        let snap = t.snapshot();
        add(&t, OutputKind::Info);
        assert_eq!(snap.len(), 1);
        assert_eq!(t.snapshot().len(), 2);
    }

    #[test]
    fn with_lock_sees_consistent_view() {
        let t = task();
        add(&t, OutputKind::Error);
        add(&t, OutputKind::Detail);
        let (errors, rescanned) = t.with_lock(|view| {
            let rescanned = view
                .lines()
                .iter()
                .filter(|l| l.kind == OutputKind::Error)
                .count();
            (view.error_count(), rescanned)
        });
        assert_eq!(errors, rescanned);
    }

    #[test]
    fn concurrent_writers_keep_counters_consistent() {
        let t = Arc::new(task());
        let writers: Vec<_> = [OutputKind::Error, OutputKind::Warning]
            .into_iter()
            .map(|kind| {
                let t = Arc::clone(&t);
                thread::spawn(move || {
                    for i in 0..500 {
                        let kind = if i % 3 == 0 { OutputKind::Detail } else { kind };
                        t.add_output_line(format!("{i}"), kind, LineContext::default());
                        if i % 50 == 0 {
                            t.update_context();
                        }
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let lines = t.snapshot();
        let errors = lines.iter().filter(|l| l.kind == OutputKind::Error).count();
        let warnings = lines.iter().filter(|l| l.kind == OutputKind::Warning).count();
        assert_eq!(t.counts(), (errors, warnings));
        assert_eq!(lines.len(), 1000);
    }

    #[test]
    fn per_writer_order_is_preserved() {
        let t = Arc::new(task());
        let writers: Vec<_> = ["out", "err"]
            .into_iter()
            .map(|stream| {
                let t = Arc::clone(&t);
                thread::spawn(move || {
                    for i in 0..200 {
                        let line = format!("{stream} {i}");
                        t.add_output_line(line, OutputKind::Detail, LineContext::default());
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        for stream in ["out", "err"] {
            let seq: Vec<usize> = t
                .snapshot()
                .iter()
                .filter_map(|l| {
                    let n = l.content.strip_prefix(&format!("{stream} "))?;
                    Some(n.parse().unwrap())
                })
                .collect();
            assert_eq!(seq, (0..200).collect::<Vec<_>>(), "{stream} order");
        }
    }
}
