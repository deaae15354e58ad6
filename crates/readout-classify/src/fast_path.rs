#![forbid(unsafe_code)]

//! Prefix fast path.
//!
//! Most lines in a noisy build log start with one of a handful of
//! conventional markers. Checking those as plain ASCII-case-insensitive
//! prefixes lets the classifier skip regex evaluation for them entirely.
//! A fast-path hit is final: scored patterns are never consulted.

use readout_core::{CognitiveLoad, LineContext, OutputKind};

/// Error markers.
pub const ERROR_PREFIXES: &[&str] = &[
    "error:",
    "panic:",
    "fatal:",
    "fatal error:",
    "[error]",
];
/// Warning markers.
pub const WARNING_PREFIXES: &[&str] = &["warning:", "warn:", "[warn]", "[warning]"];
/// Success markers.
pub const SUCCESS_PREFIXES: &[&str] = &["success:", "done:", "[ok]", "✓ "];
/// Informational markers.
pub const INFO_PREFIXES: &[&str] = &["info:", "note:", "hint:", "[info]"];

const TABLE: [(OutputKind, &[&str]); 4] = [
    (OutputKind::Error, ERROR_PREFIXES),
    (OutputKind::Warning, WARNING_PREFIXES),
    (OutputKind::Success, SUCCESS_PREFIXES),
    (OutputKind::Info, INFO_PREFIXES),
];

/// Classify by prefix alone, ignoring leading whitespace.
///
/// Returns `None` when no prefix matches and the scored path must run.
#[must_use]
pub fn classify(line: &str) -> Option<(OutputKind, LineContext)> {
    let trimmed = line.trim_start();
    TABLE
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| starts_with_ignore_case(trimmed, p)))
        .map(|(kind, _)| (*kind, context_for(*kind)))
}

/// Fixed per-kind context for a fast-path hit.
#[must_use]
pub fn context_for(kind: OutputKind) -> LineContext {
    match kind {
        OutputKind::Error => LineContext::new(5, CognitiveLoad::High).highlighted(),
        OutputKind::Warning => LineContext::new(4, CognitiveLoad::Medium).highlighted(),
        OutputKind::Success | OutputKind::Info => LineContext::new(3, CognitiveLoad::Low),
        _ => LineContext::default(),
    }
}

// Byte comparison, so a multi-byte prefix never lands mid-character.
fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    let (line, prefix) = (line.as_bytes(), prefix.as_bytes());
    line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix)
}
