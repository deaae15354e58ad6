#![forbid(unsafe_code)]

//! Top-level error type.

use std::fmt;
use std::io;

use readout_core::ConfigError;

/// Everything that can stop readout before or after the wrapped command runs.
///
/// The command's own failure is not an error here: it is reported through
/// the task status and the process exit code.
#[derive(Debug)]
pub enum Error {
    /// Writing the report or installing signal handling failed.
    Io(io::Error),
    /// The config file could not be read or parsed.
    Config(ConfigError),
    /// Bad command-line arguments.
    Usage(String),
}

impl Error {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Config(_) => 2,
            Self::Io(_) => 1,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Usage(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Usage(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for readout APIs.
pub type Result<T> = std::result::Result<T, Error>;
