#![forbid(unsafe_code)]

//! Built-in intent and output-pattern dictionary.
//!
//! This is plain data: the classifier compiles it into an owned pattern set
//! at construction. Regex sources use the `regex` crate syntax (no
//! look-around). A user config replaces any of the three tables wholesale.

use std::collections::BTreeMap;

use crate::config::{CategoryPatterns, IntentRule, PatternSpec, ToolConfig};
use crate::output::OutputKind;

/// Substring intent rules, in priority order. Each substring matches at the
/// start of a word in the command line.
#[must_use]
pub fn intents() -> Vec<IntentRule> {
    vec![
        IntentRule::new("testing", &["test", "jest", "pytest", "mocha", "vitest", "spec"]),
        IntentRule::new("linting", &["lint", "eslint", "clippy", "vet", "staticcheck"]),
        IntentRule::new("formatting", &["fmt", "gofmt", "rustfmt", "format", "prettier"]),
        IntentRule::new("building", &["build", "compile", "webpack", "tsc"]),
        IntentRule::new("installing", &["install", "npm ci"]),
        IntentRule::new("deploying", &["deploy", "publish"]),
    ]
}

/// Patterns applied to every command.
#[must_use]
pub fn output_patterns() -> Vec<CategoryPatterns> {
    vec![
        CategoryPatterns::new(
            OutputKind::Error,
            &[
                r"(?i)\berror\b",
                r"(?i)\bfail(ed|ure)?\b",
                r"(?i)\bexception\b",
                r"(?i)\bpanic(ked)?\b",
                r"(?i)\bundefined (reference|variable|symbol)\b",
                r"(?i)\bsegmentation fault\b",
            ],
        ),
        CategoryPatterns {
            kind: OutputKind::Warning,
            patterns: vec![
                PatternSpec::from(r"(?i)\bwarn(ing)?s?\b"),
                PatternSpec::from(r"(?i)\bdeprecat(ed|ion)\b"),
                // Compiler-style `file:line:col: warning:` outweighs the
                // location token's vote for Error.
                PatternSpec::weighted(r"(?i):\s*warning:", 4),
            ],
        },
        CategoryPatterns::new(
            OutputKind::Success,
            &[
                r"(?i)\b(passed|succeeded|successful(ly)?)\b",
                r"(?i)^\s*ok\b",
                r"(?i)^\s*(finished|done)\b",
            ],
        ),
        CategoryPatterns::new(
            OutputKind::Info,
            &[
                concat!(
                    r"(?i)^\s*(compiling|downloading|downloaded|installing|fetching",
                    r"|resolving|building|running|checking)\b",
                ),
            ],
        ),
        CategoryPatterns::new(
            OutputKind::Progress,
            &[r"\b\d{1,3}(\.\d+)?%", r"\[\s*\d+\s*/\s*\d+\s*\]"],
        ),
        CategoryPatterns {
            kind: OutputKind::Summary,
            patterns: vec![
                PatternSpec::from(r"(?i)^\s*(test result|summary|total)\b"),
                PatternSpec::weighted(r"(?i)\b\d+ passed\b.*\b\d+ failed\b", 2),
            ],
        },
    ]
}

/// Tool tables, keyed by `"tool"` or `"tool subcommand"`.
#[must_use]
pub fn tools() -> BTreeMap<String, ToolConfig> {
    let mut tools = BTreeMap::new();

    tools.insert(
        "go test".to_string(),
        ToolConfig {
            intent: Some("testing".to_string()),
            patterns: vec![
                CategoryPatterns::new(OutputKind::Success, &[r"^ok\s+\S+", r"^\s*--- PASS"]),
                CategoryPatterns::new(
                    OutputKind::Error,
                    &[r"^\s*--- FAIL", r"^FAIL\s", r"^panic: test timed out"],
                ),
                CategoryPatterns::new(OutputKind::Detail, &[r"^=== (RUN|PAUSE|CONT)\s"]),
            ],
        },
    );
    tools.insert(
        "go build".to_string(),
        ToolConfig {
            intent: Some("building".to_string()),
            patterns: Vec::new(),
        },
    );
    tools.insert(
        "go".to_string(),
        ToolConfig {
            intent: None,
            patterns: vec![
                CategoryPatterns::new(OutputKind::Info, &[r"^#\s+\S+"]),
                CategoryPatterns::new(OutputKind::Error, &[r": undefined: ", r"\bcannot use\b"]),
            ],
        },
    );
    tools.insert(
        "cargo".to_string(),
        ToolConfig {
            intent: None,
            patterns: vec![
                CategoryPatterns {
                    kind: OutputKind::Error,
                    patterns: vec![
                        PatternSpec::weighted(r"^error(\[E\d{4}\])?:", 2),
                        PatternSpec::from(r"test result: FAILED"),
                    ],
                },
                CategoryPatterns {
                    kind: OutputKind::Warning,
                    patterns: vec![PatternSpec::weighted(r"^warning:", 2)],
                },
                CategoryPatterns::new(
                    OutputKind::Info,
                    &[r"^\s*(Compiling|Checking|Downloading|Downloaded|Updating|Fresh|Running)\b"],
                ),
                CategoryPatterns::new(
                    OutputKind::Success,
                    &[r"^\s*Finished\b", r"test result: ok"],
                ),
                CategoryPatterns::new(OutputKind::Summary, &[r"^test result:"]),
            ],
        },
    );
    tools.insert(
        "npm".to_string(),
        ToolConfig {
            intent: None,
            patterns: vec![
                CategoryPatterns {
                    kind: OutputKind::Error,
                    patterns: vec![PatternSpec::weighted(r"^npm ERR!", 2)],
                },
                CategoryPatterns {
                    kind: OutputKind::Warning,
                    patterns: vec![PatternSpec::weighted(r"^npm WARN", 2)],
                },
                CategoryPatterns::new(OutputKind::Info, &[r"^>\s"]),
            ],
        },
    );
    tools.insert(
        "pytest".to_string(),
        ToolConfig {
            intent: Some("testing".to_string()),
            patterns: vec![
                CategoryPatterns::new(OutputKind::Error, &[r"^E\s{3}", r"\bFAILED\b"]),
                CategoryPatterns::new(OutputKind::Summary, &[r"^=+ .+ =+$"]),
            ],
        },
    );
    tools.insert(
        "make".to_string(),
        ToolConfig {
            intent: Some("building".to_string()),
            patterns: vec![
                CategoryPatterns::new(OutputKind::Error, &[r"^make(\[\d+\])?: \*\*\*"]),
                CategoryPatterns::new(
                    OutputKind::Detail,
                    &[r"^make(\[\d+\])?: (Entering|Leaving) directory"],
                ),
            ],
        },
    );
    tools.insert(
        "eslint".to_string(),
        ToolConfig {
            intent: Some("linting".to_string()),
            patterns: vec![
                CategoryPatterns::new(OutputKind::Error, &[r"^\s*\d+:\d+\s+error\b"]),
                CategoryPatterns::new(OutputKind::Warning, &[r"^\s*\d+:\d+\s+warning\b"]),
                CategoryPatterns::new(OutputKind::Summary, &[r"^✖ \d+ problems?"]),
            ],
        },
    );
    tools.insert(
        "golangci-lint".to_string(),
        ToolConfig {
            intent: Some("linting".to_string()),
            patterns: vec![CategoryPatterns {
                kind: OutputKind::Warning,
                patterns: vec![PatternSpec::weighted(r"^\S+\.go:\d+(:\d+)?: .+ \([\w-]+\)$", 4)],
            }],
        },
    );

    tools
}
