#![forbid(unsafe_code)]

//! Configuration surface consumed by the classifier and the renderer.
//!
//! Every type here deserializes with `#[serde(default)]`, so a JSON document
//! only needs the keys it wants to change:
//!
//! ```
//! use readout_core::Config;
//!
//! let config = Config::from_json_str(r#"{ "thresholds": { "error_high": 10 } }"#).unwrap();
//! assert_eq!(config.thresholds.error_high, 10);
//! assert_eq!(config.thresholds.complexity_very_high, 100);
//! ```
//!
//! # Environment overrides
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `CI`, `READOUT_CI` | force plain (non-interactive) rendering |
//! | `NO_COLOR`, `READOUT_MONOCHROME` | force monochrome (also plain) |
//! | `READOUT_SPINNER_INTERVAL_MS` | spinner tick interval |

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::dictionary;
use crate::error::ConfigError;
use crate::output::{CognitiveLoad, OutputKind};

const ENV_CI: &str = "CI";
const ENV_READOUT_CI: &str = "READOUT_CI";
const ENV_NO_COLOR: &str = "NO_COLOR";
const ENV_MONOCHROME: &str = "READOUT_MONOCHROME";
const ENV_SPINNER_INTERVAL: &str = "READOUT_SPINNER_INTERVAL_MS";

/// Braille dots, one grapheme per frame.
pub const DEFAULT_SPINNER_FRAMES: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub patterns: PatternConfig,
    pub thresholds: Thresholds,
    pub cognitive_load: CognitiveLoadConfig,
    pub spinner: SpinnerConfig,
    /// Force non-interactive rendering regardless of terminal detection.
    pub ci: bool,
    /// Disable color; implies plain rendering.
    pub monochrome: bool,
}

impl Config {
    /// Parse a JSON document, filling absent keys with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        crate::debug!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides using a custom environment lookup (for tests).
    #[must_use]
    pub fn apply_env_with<F>(mut self, get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if env_flag(&get_env, ENV_CI) || env_flag(&get_env, ENV_READOUT_CI) {
            self.ci = true;
        }
        // NO_COLOR is honored when present at all, per no-color.org.
        if get_env(ENV_NO_COLOR).is_some() || env_flag(&get_env, ENV_MONOCHROME) {
            self.monochrome = true;
        }
        if let Some(ms) = get_env(ENV_SPINNER_INTERVAL).and_then(|v| v.trim().parse().ok()) {
            self.spinner.interval_ms = ms;
        }
        self
    }
}

fn env_flag<F>(get_env: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(key) {
        Some(value) => {
            let value = value.trim().to_ascii_lowercase();
            !(value.is_empty() || value == "0" || value == "false" || value == "no")
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// The five knobs behind complexity and cognitive-load derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// More lines than this ⇒ complexity 5.
    pub complexity_very_high: usize,
    /// More lines than this ⇒ complexity 4.
    pub complexity_high: usize,
    /// More lines than this ⇒ complexity 3.
    pub complexity_medium: usize,
    /// More errors than this ⇒ high load.
    pub error_high: usize,
    /// More warnings than this ⇒ at least medium load.
    pub warning_medium: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            complexity_very_high: 100,
            complexity_high: 50,
            complexity_medium: 20,
            error_high: 5,
            warning_medium: 2,
        }
    }
}

impl Thresholds {
    /// Complexity tier (2..=5) for a number of output lines.
    #[must_use]
    pub fn complexity_for(&self, line_count: usize) -> u8 {
        if line_count > self.complexity_very_high {
            5
        } else if line_count > self.complexity_high {
            4
        } else if line_count > self.complexity_medium {
            3
        } else {
            2
        }
    }

    /// Cognitive load from problem counts and complexity.
    ///
    /// High wins over Medium wins over Low; the first matching rule decides.
    #[must_use]
    pub fn load_for(&self, errors: usize, warnings: usize, complexity: u8) -> CognitiveLoad {
        if errors > self.error_high || complexity >= 4 {
            CognitiveLoad::High
        } else if errors > 0 || warnings > self.warning_medium || complexity == 3 {
            CognitiveLoad::Medium
        } else {
            CognitiveLoad::Low
        }
    }
}

/// Whether load is estimated from output or fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitiveLoadConfig {
    pub auto_detect: bool,
    /// Used unconditionally when `auto_detect` is off.
    pub default: CognitiveLoad,
}

impl Default for CognitiveLoadConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            default: CognitiveLoad::Medium,
        }
    }
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Spinner glyphs and tick rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinnerConfig {
    /// Frames as one string; each grapheme cluster is one frame.
    pub frames: String,
    pub interval_ms: u64,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            frames: DEFAULT_SPINNER_FRAMES.to_string(),
            interval_ms: 180,
        }
    }
}

impl SpinnerConfig {
    /// Split `frames` into grapheme clusters, so multi-byte glyphs are never
    /// cut in half. Falls back to the default set when `frames` is blank.
    #[must_use]
    pub fn glyphs(&self) -> Vec<String> {
        let source = if self.frames.trim().is_empty() {
            DEFAULT_SPINNER_FRAMES
        } else {
            self.frames.as_str()
        };
        source
            .graphemes(true)
            .filter(|g| !g.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Tick interval, never zero.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// Pattern dictionary
// ---------------------------------------------------------------------------

/// Intent, tool, and output-pattern dictionaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Substring rules, checked in order.
    pub intents: Vec<IntentRule>,
    /// Keyed by `"tool"` or `"tool subcommand"`.
    pub tools: BTreeMap<String, ToolConfig>,
    /// Patterns applied to every command.
    pub output: Vec<CategoryPatterns>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            intents: dictionary::intents(),
            tools: dictionary::tools(),
            output: dictionary::output_patterns(),
        }
    }
}

impl PatternConfig {
    /// A dictionary with no rules at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            intents: Vec::new(),
            tools: BTreeMap::new(),
            output: Vec::new(),
        }
    }
}

/// `intent` applies when the command line contains any of `substrings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRule {
    pub intent: String,
    pub substrings: Vec<String>,
}

impl IntentRule {
    #[must_use]
    pub fn new(intent: &str, substrings: &[&str]) -> Self {
        Self {
            intent: intent.to_string(),
            substrings: substrings.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Tool-specific intent and output patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub intent: Option<String>,
    pub patterns: Vec<CategoryPatterns>,
}

/// Regexes that vote for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatterns {
    pub kind: OutputKind,
    pub patterns: Vec<PatternSpec>,
}

impl CategoryPatterns {
    /// Weight-1 patterns for `kind`.
    #[must_use]
    pub fn new(kind: OutputKind, patterns: &[&str]) -> Self {
        Self {
            kind,
            patterns: patterns.iter().map(|p| PatternSpec::from(*p)).collect(),
        }
    }
}

/// A regex source, optionally weighted. A bare JSON string has weight 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Bare(String),
    Weighted {
        pattern: String,
        #[serde(default = "default_weight")]
        weight: u32,
    },
}

fn default_weight() -> u32 {
    1
}

impl PatternSpec {
    #[must_use]
    pub fn weighted(pattern: &str, weight: u32) -> Self {
        Self::Weighted {
            pattern: pattern.to_string(),
            weight,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Bare(p) | Self::Weighted { pattern: p, .. } => p,
        }
    }

    #[must_use]
    pub fn weight(&self) -> u32 {
        match self {
            Self::Bare(_) => 1,
            Self::Weighted { weight, .. } => *weight,
        }
    }
}

impl From<&str> for PatternSpec {
    fn from(pattern: &str) -> Self {
        Self::Bare(pattern.to_string())
    }
}
