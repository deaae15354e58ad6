#![forbid(unsafe_code)]

//! Display-mode detection.
//!
//! | Condition                                 | Mode          |
//! |-------------------------------------------|---------------|
//! | `config.ci` (CI / `READOUT_CI`)           | `Plain`       |
//! | `config.monochrome` (`NO_COLOR`, config)  | `Plain`       |
//! | output is not a TTY                       | `Plain`       |
//! | `TERM=dumb` or empty                      | `Plain`       |
//! | `TERM` unset (Unix only)                  | `Plain`       |
//! | otherwise                                 | `Interactive` |

use std::env;
use std::fmt;
use std::io;

use crossterm::tty::IsTty;
use readout_core::Config;

/// How progress frames are presented. The state machine is the same in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// ANSI frames redrawn in place, with a spinner.
    Interactive,
    /// One line at start and one at completion; no escape sequences.
    Plain,
}

impl DisplayMode {
    /// Detect from the process environment and whether stdout is a TTY.
    #[must_use]
    pub fn detect(config: &Config) -> Self {
        Self::detect_with(|key| env::var(key).ok(), io::stdout().is_tty(), config)
    }

    /// Detect with an explicit environment lookup.
    #[must_use]
    pub fn detect_with<F>(get_env: F, is_tty: bool, config: &Config) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if config.ci || config.monochrome || !is_tty {
            return Self::Plain;
        }
        match get_env("TERM") {
            Some(term) if term.is_empty() || term == "dumb" => Self::Plain,
            None if cfg!(unix) => Self::Plain,
            _ => Self::Interactive,
        }
    }

    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Interactive)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interactive => "interactive",
            Self::Plain => "plain",
        })
    }
}
