#![forbid(unsafe_code)]

//! Child-process capture.
//!
//! One reader thread per stream decodes lines, classifies them outside the
//! task lock, and appends them to the shared [`TaskState`]. Per-stream order
//! is preserved; stdout and stderr interleave as they arrive.
//!
//! A command that cannot be started is still a completed task: the failure
//! becomes an internal Error line and the exit code is 127 (not found) or 1.
//!
//! # Draining after exit
//!
//! A background grandchild can hold the pipes open long after the command
//! itself has exited. Once the child is reaped the readers are waited for
//! while lines keep arriving, and detached otherwise:
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | no new line for [`DRAIN_IDLE`] | detach |
//! | drain longer than [`DRAIN_LIMIT`] | detach |
//! | stop signal fired | detach |
//!
//! A detached reader appends nothing more to the task.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use readout_classify::LineClassifier;
use readout_core::{CognitiveLoad, Config, LineContext, OutputKind, TaskState};

use crate::live_progress::LiveProgress;
use crate::stop_signal::StopSignal;

/// Poll period of the wait loop while a stop signal is armed.
const WAIT_POLL: Duration = Duration::from_millis(20);
/// How long a stopped child gets to exit on its own before it is killed.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Silence after exit that ends the drain.
pub const DRAIN_IDLE: Duration = Duration::from_millis(300);
/// Upper bound on the drain after exit.
pub const DRAIN_LIMIT: Duration = Duration::from_secs(5);

/// Exit code recorded when the command does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;

/// What to run and how to present it.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Display label; defaults to `"<Intent> <command>"`.
    pub label: Option<String>,
    pub command: String,
    pub args: Vec<String>,
    /// Animate the running frame (interactive mode only).
    pub spinner: bool,
    /// Mark the task for the full report regardless of load.
    pub detail: bool,
    /// Cancels the spinner and, after a grace period, the child.
    pub stop: Option<StopSignal>,
}

impl RunRequest {
    #[must_use]
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: None,
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            spinner: true,
            detail: false,
            stop: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn spinner(mut self, enabled: bool) -> Self {
        self.spinner = enabled;
        self
    }

    #[must_use]
    pub fn detail(mut self, enabled: bool) -> Self {
        self.detail = enabled;
        self
    }

    #[must_use]
    pub fn stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// Runs commands into [`TaskState`]s.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    classifier: Arc<LineClassifier>,
    config: Config,
}

impl CommandRunner {
    #[must_use]
    pub fn new(classifier: Arc<LineClassifier>, config: Config) -> Self {
        Self { classifier, config }
    }

    /// Build the classifier from `config.patterns`.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let classifier = Arc::new(LineClassifier::from_config(&config));
        Self::new(classifier, config)
    }

    #[must_use]
    pub fn classifier(&self) -> &Arc<LineClassifier> {
        &self.classifier
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The task a request would run as: intent detected, label resolved.
    #[must_use]
    pub fn prepare(&self, request: &RunRequest) -> TaskState {
        let intent = self
            .classifier
            .detect_command_intent(&request.command, &request.args);
        let label = request
            .label
            .clone()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| default_label(&intent, &request.command));
        let task = TaskState::with_thresholds(
            label,
            intent,
            request.command.clone(),
            request.args.clone(),
            self.config.thresholds,
        );
        task.set_detail_view(request.detail);
        task
    }

    /// Run with progress on stdout.
    pub fn run(&self, request: RunRequest) -> Arc<TaskState> {
        let mut progress = LiveProgress::stdout(&self.config);
        self.run_with(request, &mut progress)
    }

    /// Run with progress on an explicit renderer.
    pub fn run_with<W: Write + Send + 'static>(
        &self,
        request: RunRequest,
        progress: &mut LiveProgress<W>,
    ) -> Arc<TaskState> {
        let task = Arc::new(self.prepare(&request));
        let ticker_stop = request.stop.clone().unwrap_or_else(StopSignal::never);
        progress.start(task.label(), ticker_stop, request.spinner);

        let spawned = Command::new(&request.command)
            .args(&request.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let code = match spawned {
            Ok(child) => {
                tracing::info!(
                    command = %request.command,
                    intent = task.intent(),
                    pid = child.id(),
                    "spawned"
                );
                self.capture(child, &task, request.stop.as_ref())
            }
            Err(err) => {
                tracing::info!(command = %request.command, error = %err, "spawn failed");
                record_internal(&task, format!("failed to start process: {err}"));
                if err.kind() == io::ErrorKind::NotFound {
                    EXIT_NOT_FOUND
                } else {
                    1
                }
            }
        };

        let status = task.complete(code);
        progress.complete(status.into());
        let (errors, warnings) = task.counts();
        tracing::info!(
            exit_code = code,
            status = %status,
            lines = task.line_count(),
            errors,
            warnings,
            "finished"
        );
        task
    }

    fn capture(&self, mut child: Child, task: &Arc<TaskState>, stop: Option<&StopSignal>) -> i32 {
        let (done_tx, done_rx) = mpsc::channel();
        let shared = ReaderShared::default();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(self.spawn_reader("stdout", stdout, task, &shared, done_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(self.spawn_reader("stderr", stderr, task, &shared, done_tx.clone()));
        }
        drop(done_tx);

        let waited = match stop {
            Some(stop) => wait_until_stopped(&mut child, stop),
            None => child.wait(),
        };

        drain_readers(readers, &done_rx, &shared, stop);

        match waited {
            Ok(status) => exit_code(status),
            Err(err) => {
                record_internal(task, format!("failed to wait for process: {err}"));
                1
            }
        }
    }

    fn spawn_reader<R: Read + Send + 'static>(
        &self,
        stream: &'static str,
        reader: R,
        task: &Arc<TaskState>,
        shared: &ReaderShared,
        done: Sender<&'static str>,
    ) -> JoinHandle<()> {
        let task = Arc::clone(task);
        let classifier = Arc::clone(&self.classifier);
        let shared = shared.clone();
        thread::spawn(move || {
            read_lines(stream, reader, &task, &classifier, &shared);
            let _ = done.send(stream);
        })
    }
}

/// State the runner shares with its reader threads.
#[derive(Debug, Clone, Default)]
struct ReaderShared {
    /// Lines read so far across both streams.
    lines: Arc<AtomicUsize>,
    /// Set when the drain gives up; readers stop appending.
    detached: Arc<AtomicBool>,
}

fn drain_readers(
    readers: Vec<JoinHandle<()>>,
    done: &Receiver<&'static str>,
    shared: &ReaderShared,
    stop: Option<&StopSignal>,
) {
    let started = Instant::now();
    let mut pending = readers.len();
    let mut seen = shared.lines.load(Ordering::Relaxed);
    let mut last_progress = started;

    while pending > 0 {
        match done.recv_timeout(WAIT_POLL) {
            Ok(_) => {
                pending -= 1;
                continue;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        let now = shared.lines.load(Ordering::Relaxed);
        if now != seen {
            seen = now;
            last_progress = Instant::now();
        }
        let stopped = stop.is_some_and(StopSignal::is_stopped);
        if stopped || last_progress.elapsed() >= DRAIN_IDLE || started.elapsed() >= DRAIN_LIMIT {
            shared.detached.store(true, Ordering::Relaxed);
            tracing::warn!(
                pending,
                stopped,
                waited_ms = started.elapsed().as_millis() as u64,
                "output still open after exit, detaching readers"
            );
            break;
        }
    }

    for reader in readers {
        if reader.is_finished() && reader.join().is_err() {
            tracing::warn!("output reader panicked");
        }
    }
}

fn read_lines<R: Read>(
    stream: &str,
    reader: R,
    task: &TaskState,
    classifier: &LineClassifier,
    shared: &ReaderShared,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0usize;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if shared.detached.load(Ordering::Relaxed) {
                    break;
                }
                let line = decode_line(&buf);
                let (kind, ctx) =
                    classifier.classify_output_line(&line, task.command(), task.args());
                task.add_output_line(line, kind, ctx);
                shared.lines.fetch_add(1, Ordering::Relaxed);
                count += 1;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                tracing::debug!(stream, error = %err, "stream read failed");
                break;
            }
        }
    }
    task.update_context();
    tracing::debug!(stream, lines = count, "stream closed");
}

/// Lossy UTF-8 without the trailing `\n` or `\r\n`.
fn decode_line(buf: &[u8]) -> String {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    let buf = buf.strip_suffix(b"\r").unwrap_or(buf);
    String::from_utf8_lossy(buf).into_owned()
}

fn wait_until_stopped(child: &mut Child, stop: &StopSignal) -> io::Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if stop.wait_timeout(WAIT_POLL) {
            break;
        }
    }

    let deadline = Instant::now() + KILL_GRACE;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        thread::sleep(WAIT_POLL);
    }
    tracing::warn!(pid = child.id(), "child still running after stop, killing");
    if let Err(err) = child.kill() {
        tracing::debug!(error = %err, "kill failed");
    }
    child.wait()
}

/// Exit code, or `128 + signal` for a signal-terminated child on Unix.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

fn record_internal(task: &TaskState, message: String) {
    task.add_output_line(
        message,
        OutputKind::Error,
        LineContext::new(5, CognitiveLoad::High).highlighted().internal(),
    );
}

fn default_label(intent: &str, command: &str) -> String {
    let mut chars = intent.chars();
    let head: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
    format!("{head}{} {command}", chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_strips_line_endings() {
        assert_eq!(decode_line(b"hello\n"), "hello");
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"\n"), "");
    }

    #[test]
    fn decode_is_lossy() {
        assert_eq!(decode_line(b"bad \xff byte\n"), "bad \u{FFFD} byte");
    }

    #[test]
    fn default_label_capitalizes_intent() {
        assert_eq!(default_label("testing", "go"), "Testing go");
        assert_eq!(default_label("", "make"), " make");
    }

    #[test]
    fn request_builder() {
        let req = RunRequest::new("cargo", ["build", "--release"])
            .label("Build")
            .spinner(false)
            .detail(true);
        assert_eq!(req.command, "cargo");
        assert_eq!(req.args, vec!["build", "--release"]);
        assert_eq!(req.label.as_deref(), Some("Build"));
        assert!(!req.spinner);
        assert!(req.detail);
        assert!(req.stop.is_none());
    }

    #[test]
    fn prepare_resolves_intent_and_label() {
        let runner = CommandRunner::from_config(Config::default());
        let task = runner.prepare(&RunRequest::new("go", ["test", "./..."]));
        assert_eq!(task.intent(), "testing");
        assert_eq!(task.label(), "Testing go");

        let task = runner.prepare(&RunRequest::new("go", ["test"]).label("  ").detail(true));
        assert_eq!(task.label(), "Testing go");
        assert!(task.context().is_detail_view);

        let task = runner.prepare(&RunRequest::new("go", ["test"]).label("Unit tests"));
        assert_eq!(task.label(), "Unit tests");
    }

    #[cfg(unix)]
    #[test]
    fn signal_exit_maps_to_128_plus_signal() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
    }
}
