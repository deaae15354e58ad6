#![forbid(unsafe_code)]

//! Live progress: the interim frame shown while a command runs.
//!
//! # State machine
//!
//! ```text
//!   Inactive --start--> Active --complete--> Inactive
//!                          |
//!                          +-- ticker (Interactive + spinner only):
//!                              wait(interval | stop) -> lock -> Active? -> render
//! ```
//!
//! # Invariants
//!
//! 1. The `active` flag, the writer, and the frame generation share one
//!    mutex. The ticker checks the flag and renders while holding it, and
//!    `complete` clears the flag and writes the terminal frame while holding
//!    it, so no running frame can follow the terminal frame.
//! 2. The ticker waits on the caller's [`StopSignal`] with a timeout of one
//!    interval: cancellation is observed within one tick and no frame is
//!    written after it.
//! 3. The spinner index is owned by the ticker thread alone.
//! 4. Glyphs are grapheme clusters, never bytes.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Write error | closed pipe, full disk | logged at debug, frame skipped |
//! | `start` while active | caller bug | logged at warn, ignored |
//! | `complete` while inactive | caller bug | logged at warn, returns zero |
//! | Dropped while active | early return, panic | line cleared, cursor shown |

use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveToColumn, Show};
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use readout_core::{Config, SpinnerConfig, TaskStatus};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::stop_signal::StopSignal;
use crate::terminal::DisplayMode;

/// Columns kept free for the glyph and elapsed time in interactive frames.
const LABEL_RESERVE: usize = 14;
/// Labels are never truncated below this width.
const MIN_LABEL_WIDTH: usize = 8;

/// How a finished task is presented in its terminal frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressOutcome {
    Success,
    Warning,
    Error,
    Info,
}

impl ProgressOutcome {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Info => "INFO",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
            Self::Info => "ℹ",
        }
    }

    const fn color(self) -> Color {
        match self {
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
            Self::Info => Color::Blue,
        }
    }
}

impl From<TaskStatus> for ProgressOutcome {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Success => Self::Success,
            TaskStatus::Warning => Self::Warning,
            TaskStatus::Error => Self::Error,
            TaskStatus::Running => Self::Info,
        }
    }
}

/// Elapsed time as `Nms`, `N.Ns`, `NmSSs`, or `NhMMmSSs`.
#[must_use]
pub fn format_elapsed(d: Duration) -> String {
    let total_secs = d.as_secs();
    if total_secs == 0 {
        return format!("{}ms", d.as_millis());
    }
    if total_secs < 60 {
        return format!("{total_secs}.{}s", d.subsec_millis() / 100);
    }
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m{seconds:02}s")
    } else {
        format!("{minutes}m{seconds:02}s")
    }
}

/// Truncate `label` to `max_width` display columns, ending in `…` when cut.
#[must_use]
pub fn fit_label(label: &str, max_width: usize) -> Cow<'_, str> {
    if label.width() <= max_width {
        return Cow::Borrowed(label);
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for grapheme in label.graphemes(true) {
        let w = grapheme.width();
        if used + w > budget {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push('…');
    Cow::Owned(out)
}

struct Frame<W> {
    writer: W,
    active: bool,
    generation: u64,
    label: String,
    started: Instant,
    cursor_hidden: bool,
}

fn lock<W>(shared: &Mutex<Frame<W>>) -> MutexGuard<'_, Frame<W>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spinner state machine writing frames to `W`.
pub struct LiveProgress<W: Write + Send + 'static> {
    shared: Arc<Mutex<Frame<W>>>,
    mode: DisplayMode,
    glyphs: Arc<[String]>,
    interval: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl LiveProgress<io::Stdout> {
    /// Progress on stdout, mode detected from the environment.
    #[must_use]
    pub fn stdout(config: &Config) -> Self {
        Self::new(io::stdout(), DisplayMode::detect(config), &config.spinner)
    }
}

impl<W: Write + Send + 'static> LiveProgress<W> {
    #[must_use]
    pub fn new(writer: W, mode: DisplayMode, spinner: &SpinnerConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Frame {
                writer,
                active: false,
                generation: 0,
                label: String::new(),
                started: Instant::now(),
                cursor_hidden: false,
            })),
            mode,
            glyphs: spinner.glyphs().into(),
            interval: spinner.interval(),
            ticker: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.shared).active
    }

    /// Whether a ticker thread is still running.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Enter `Active` and render the first running frame.
    ///
    /// The ticker is spawned only when `enable_spinner` is set and the mode
    /// is interactive. It stops on `stop`, on [`complete`](Self::complete),
    /// or when this value is dropped.
    pub fn start(&mut self, label: impl Into<String>, stop: StopSignal, enable_spinner: bool) {
        let generation = {
            let mut frame = lock(&self.shared);
            if frame.active {
                tracing::warn!(label = %frame.label, "progress already active; start ignored");
                return;
            }
            let label = label.into();
            frame.label = match self.mode {
                DisplayMode::Interactive => match crossterm::terminal::size() {
                    Ok((cols, _)) => {
                        let max = usize::from(cols)
                            .saturating_sub(LABEL_RESERVE)
                            .max(MIN_LABEL_WIDTH);
                        fit_label(&label, max).into_owned()
                    }
                    Err(_) => label,
                },
                DisplayMode::Plain => label,
            };
            frame.active = true;
            frame.generation += 1;
            frame.started = Instant::now();
            let glyph = self.glyphs.first().map_or("", String::as_str);
            if let Err(err) = render_running(&mut frame, self.mode, glyph) {
                tracing::debug!(error = %err, "running frame not written");
            }
            frame.generation
        };

        if enable_spinner && self.mode.is_interactive() {
            let shared = Arc::clone(&self.shared);
            let glyphs = Arc::clone(&self.glyphs);
            let interval = self.interval;
            tracing::debug!(interval_ms = interval.as_millis() as u64, "spinner started");
            self.ticker = Some(thread::spawn(move || {
                tick_loop(&shared, &glyphs, interval, &stop, generation);
            }));
        }
    }

    /// Leave `Active` and render the terminal frame. Returns the elapsed time.
    pub fn complete(&mut self, outcome: ProgressOutcome) -> Duration {
        let mut frame = lock(&self.shared);
        if !frame.active {
            tracing::warn!(outcome = outcome.tag(), "progress not active; complete ignored");
            return Duration::ZERO;
        }
        frame.active = false;
        let elapsed = frame.started.elapsed();
        if let Err(err) = render_final(&mut frame, self.mode, outcome, elapsed) {
            tracing::debug!(error = %err, "terminal frame not written");
        }
        tracing::debug!(
            outcome = outcome.tag(),
            elapsed_ms = elapsed.as_millis() as u64,
            "progress completed"
        );
        elapsed
    }
}

impl<W: Write + Send + 'static> Drop for LiveProgress<W> {
    fn drop(&mut self) {
        let mut frame = lock(&self.shared);
        frame.active = false;
        if frame.cursor_hidden {
            frame.cursor_hidden = false;
            let _ = queue!(frame.writer, MoveToColumn(0), Clear(ClearType::CurrentLine), Show);
            let _ = frame.writer.flush();
        }
    }
}

fn tick_loop<W: Write>(
    shared: &Mutex<Frame<W>>,
    glyphs: &[String],
    interval: Duration,
    stop: &StopSignal,
    generation: u64,
) {
    let mut index = 0usize;
    loop {
        if stop.wait_timeout(interval) {
            tracing::debug!("spinner cancelled");
            return;
        }
        let mut frame = lock(shared);
        if !frame.active || frame.generation != generation {
            tracing::debug!("spinner stopped");
            return;
        }
        index = (index + 1) % glyphs.len().max(1);
        let glyph = glyphs.get(index).map_or("", String::as_str);
        if let Err(err) = render_running(&mut frame, DisplayMode::Interactive, glyph) {
            tracing::debug!(error = %err, "spinner frame not written");
        }
    }
}

fn render_running<W: Write>(
    frame: &mut Frame<W>,
    mode: DisplayMode,
    glyph: &str,
) -> io::Result<()> {
    match mode {
        DisplayMode::Plain => {
            writeln!(frame.writer, "[RUNNING] {}", frame.label)?;
        }
        DisplayMode::Interactive => {
            if !frame.cursor_hidden {
                queue!(frame.writer, Hide)?;
                frame.cursor_hidden = true;
            }
            let elapsed = format_elapsed(frame.started.elapsed());
            queue!(
                frame.writer,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                SetForegroundColor(Color::Cyan),
                Print(glyph),
                ResetColor,
                Print(format!(" {} ", frame.label)),
                SetAttribute(Attribute::Dim),
                Print(elapsed),
                SetAttribute(Attribute::Reset),
            )?;
        }
    }
    frame.writer.flush()
}

fn render_final<W: Write>(
    frame: &mut Frame<W>,
    mode: DisplayMode,
    outcome: ProgressOutcome,
    elapsed: Duration,
) -> io::Result<()> {
    let elapsed = format_elapsed(elapsed);
    match mode {
        DisplayMode::Plain => {
            writeln!(frame.writer, "[{}] {} ({elapsed})", outcome.tag(), frame.label)?;
        }
        DisplayMode::Interactive => {
            queue!(
                frame.writer,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                SetForegroundColor(outcome.color()),
                Print(outcome.symbol()),
                ResetColor,
                Print(format!(" {} ", frame.label)),
                SetAttribute(Attribute::Dim),
                Print(format!("({elapsed})")),
                SetAttribute(Attribute::Reset),
                Print("\n"),
            )?;
            if frame.cursor_hidden {
                queue!(frame.writer, Show)?;
                frame.cursor_hidden = false;
            }
        }
    }
    frame.writer.flush()
}
