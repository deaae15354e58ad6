#![forbid(unsafe_code)]

//! Command-intent detection.
//!
//! Tiers, first match wins:
//!
//! 1. configured intent for `"tool subcommand"`, then for `"tool"`
//! 2. configured substring rules against the lowercased command line; a
//!    substring only counts where it starts a word (`latest` does not
//!    contain `test`, `./test.sh` does)
//! 3. a common verb as prefix or suffix of the tool name
//! 4. a common verb inside any argument
//! 5. `"running"`
//!
//! Every table is ordered, so detection is reproducible.

use std::collections::BTreeMap;
use std::path::Path;

use readout_core::{IntentRule, PatternConfig};

/// Fallback intent.
pub const DEFAULT_INTENT: &str = "running";

/// Common verbs and the intent each implies, in priority order.
pub const VERB_INTENTS: &[(&str, &str)] = &[
    ("build", "building"),
    ("test", "testing"),
    ("check", "checking"),
    ("lint", "linting"),
    ("run", "running"),
    ("install", "installing"),
    ("format", "formatting"),
    ("clean", "cleaning"),
    ("fetch", "fetching"),
    ("pull", "pulling"),
    ("push", "pushing"),
    ("deploy", "deploying"),
];

/// Base name of a command path, without a Windows `.exe` suffix.
#[must_use]
pub fn tool_name(command: &str) -> String {
    let base = Path::new(command)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(command);
    base.strip_suffix(".exe").unwrap_or(base).to_string()
}

/// Lookup keys for tool tables: `"tool first-arg"` (when there is an
/// argument) followed by `"tool"`.
#[must_use]
pub fn tool_keys<S: AsRef<str>>(command: &str, args: &[S]) -> Vec<String> {
    let tool = tool_name(command);
    let mut keys = Vec::with_capacity(2);
    if let Some(first) = args.first() {
        keys.push(format!("{tool} {}", first.as_ref()));
    }
    keys.push(tool);
    keys
}

fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '\\' | '@' | '=' | ':' | ',' | '-' | '.' | '_')
}

/// Whether `needle` occurs in `haystack` at the start of a word.
fn contains_word_prefix(haystack: &str, needle: &str) -> bool {
    !needle.is_empty()
        && haystack.match_indices(needle).any(|(at, _)| {
            haystack[..at].chars().next_back().is_none_or(is_word_separator)
        })
}

/// Intent dictionaries extracted from a [`PatternConfig`].
#[derive(Debug, Clone, Default)]
pub struct IntentTable {
    tool_intents: BTreeMap<String, String>,
    rules: Vec<IntentRule>,
}

impl IntentTable {
    #[must_use]
    pub fn from_config(config: &PatternConfig) -> Self {
        let tool_intents = config
            .tools
            .iter()
            .filter_map(|(key, tool)| tool.intent.clone().map(|intent| (key.clone(), intent)))
            .collect();
        let rules = config
            .intents
            .iter()
            .map(|rule| IntentRule {
                intent: rule.intent.clone(),
                substrings: rule.substrings.iter().map(|s| s.to_lowercase()).collect(),
            })
            .collect();
        Self {
            tool_intents,
            rules,
        }
    }

    /// Detect what the command is doing.
    #[must_use]
    pub fn detect<S: AsRef<str>>(&self, command: &str, args: &[S]) -> String {
        // 1. tool-specific
        for key in tool_keys(command, args) {
            if let Some(intent) = self.tool_intents.get(&key) {
                return intent.clone();
            }
        }

        let tool = tool_name(command).to_lowercase();

        // 2. substring dictionary
        let mut haystack = tool.clone();
        for arg in args {
            haystack.push(' ');
            haystack.push_str(&arg.as_ref().to_lowercase());
        }
        for rule in &self.rules {
            if rule.substrings.iter().any(|s| contains_word_prefix(&haystack, s)) {
                return rule.intent.clone();
            }
        }

        // 3. verb as prefix/suffix of the tool name
        for (verb, intent) in VERB_INTENTS {
            if tool.starts_with(verb) || tool.ends_with(verb) {
                return (*intent).to_string();
            }
        }

        // 4. verb inside an argument
        for arg in args {
            let arg = arg.as_ref().to_lowercase();
            if let Some((_, intent)) = VERB_INTENTS.iter().find(|(verb, _)| arg.contains(verb)) {
                return (*intent).to_string();
            }
        }

        DEFAULT_INTENT.to_string()
    }
}
