#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Parses args manually: options come first, and the first non-option
//! argument (or everything after `--`) is the command to wrap. Flags after
//! the command belong to the command.

use std::path::PathBuf;

use readout_core::Config;
use readout_runtime::{RunRequest, StopSignal};

use crate::error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a config file when `--config` is absent.
pub const ENV_CONFIG: &str = "READOUT_CONFIG";

pub const HELP_TEXT: &str = "\
readout - run a command with adaptive live progress

USAGE:
    readout [OPTIONS] [--] <COMMAND> [ARGS...]

OPTIONS:
    --label <LABEL>      Label shown next to the spinner (default: \"<Intent> <command>\")
    --ci                 Plain output: no ANSI frames, no spinner
    --no-spinner         Keep interactive frames but do not animate
    --detail             Always print the full captured output
    --config <FILE>      JSON config file (patterns, thresholds, spinner)
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    READOUT_CONFIG               Config file when --config is not given
    READOUT_LOG                  Log filter for diagnostics on stderr (e.g. debug)
    CI, READOUT_CI               Force plain output
    NO_COLOR, READOUT_MONOCHROME Force plain output
    READOUT_SPINNER_INTERVAL_MS  Spinner tick interval

EXIT STATUS:
    The wrapped command's exit code; 128+N if it was killed by signal N;
    127 if it could not be found; 2 for usage or config errors.";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opts {
    pub label: Option<String>,
    pub ci: bool,
    pub spinner: bool,
    pub detail: bool,
    pub config: Option<PathBuf>,
    pub command: String,
    pub args: Vec<String>,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse arguments (without the program name).
    pub fn parse_from<I, S>(args: I) -> Result<Parsed>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut opts = Self {
            spinner: true,
            ..Self::default()
        };

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            match arg {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--ci" => opts.ci = true,
                "--no-spinner" => opts.spinner = false,
                "--detail" => opts.detail = true,
                "--label" => {
                    i += 1;
                    opts.label = Some(value_for("--label", args.get(i))?);
                }
                "--config" => {
                    i += 1;
                    opts.config = Some(PathBuf::from(value_for("--config", args.get(i))?));
                }
                "--" => {
                    i += 1;
                    break;
                }
                other => {
                    if let Some(val) = other.strip_prefix("--label=") {
                        opts.label = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--config=") {
                        opts.config = Some(PathBuf::from(val));
                    } else if other.starts_with('-') && other.len() > 1 {
                        return Err(Error::Usage(format!("unknown option: {other}")));
                    } else {
                        break;
                    }
                }
            }
            i += 1;
        }

        let mut rest = args.into_iter().skip(i);
        opts.command = rest
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Usage("missing command to run".to_string()))?;
        opts.args = rest.collect();
        Ok(Parsed::Run(opts))
    }

    /// Resolve configuration: file (`--config`, then `READOUT_CONFIG`), then
    /// environment overrides, then flags.
    pub fn load_config<F>(&self, get_env: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = self
            .config
            .clone()
            .or_else(|| get_env(ENV_CONFIG).filter(|p| !p.is_empty()).map(PathBuf::from));
        let config = match path {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };
        let mut config = config.apply_env_with(get_env);
        if self.ci {
            config.ci = true;
        }
        Ok(config)
    }

    /// The run request for these options.
    #[must_use]
    pub fn request(&self, stop: StopSignal) -> RunRequest {
        let mut request = RunRequest::new(self.command.clone(), self.args.clone())
            .spinner(self.spinner)
            .detail(self.detail)
            .stop(stop);
        if let Some(label) = &self.label {
            request = request.label(label.clone());
        }
        request
    }
}

fn value_for(flag: &str, value: Option<&String>) -> Result<String> {
    value
        .cloned()
        .ok_or_else(|| Error::Usage(format!("{flag} requires a value")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn run_opts(args: &[&str]) -> Opts {
        match Opts::parse_from(args.iter().copied()).unwrap() {
            Parsed::Run(opts) => opts,
            other => panic!("expected run, got {other:?}"),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn bare_command() {
        let opts = run_opts(&["go", "test", "./..."]);
        assert_eq!(opts.command, "go");
        assert_eq!(opts.args, vec!["test", "./..."]);
        assert!(opts.spinner);
        assert!(!opts.ci);
        assert_eq!(opts.label, None);
    }

    #[test]
    fn options_before_command() {
        let opts = run_opts(&[
            "--label",
            "Unit tests",
            "--ci",
            "--no-spinner",
            "--detail",
            "cargo",
            "test",
        ]);
        assert_eq!(opts.label.as_deref(), Some("Unit tests"));
        assert!(opts.ci);
        assert!(!opts.spinner);
        assert!(opts.detail);
        assert_eq!(opts.command, "cargo");
    }

    #[test]
    fn equals_forms() {
        let opts = run_opts(&["--label=Build", "--config=/tmp/r.json", "make"]);
        assert_eq!(opts.label.as_deref(), Some("Build"));
        assert_eq!(opts.config, Some(PathBuf::from("/tmp/r.json")));
    }

    #[test]
    fn flags_after_command_belong_to_it() {
        let opts = run_opts(&["ls", "--ci", "-la"]);
        assert_eq!(opts.command, "ls");
        assert_eq!(opts.args, vec!["--ci", "-la"]);
        assert!(!opts.ci);
    }

    #[test]
    fn double_dash_ends_options() {
        let opts = run_opts(&["--ci", "--", "--weird-command", "x"]);
        assert_eq!(opts.command, "--weird-command");
        assert_eq!(opts.args, vec!["x"]);
    }

    #[test]
    fn help_and_version() {
        assert_eq!(Opts::parse_from(["--help"]).unwrap(), Parsed::Help);
        assert_eq!(Opts::parse_from(["-V", "x"]).unwrap(), Parsed::Version);
    }

    #[test]
    fn usage_errors() {
        for args in [&[][..], &["--ci"][..], &["--label"][..], &["--bogus", "ls"][..]] {
            let err = Opts::parse_from(args.iter().copied()).unwrap_err();
            assert!(matches!(err, Error::Usage(_)), "{args:?}: {err}");
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn config_from_flag_env_and_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"spinner": {{"interval_ms": 50}}}}"#).unwrap();

        let opts = Opts {
            config: Some(file.path().to_path_buf()),
            ci: true,
            ..run_opts(&["true"])
        };
        let config = opts.load_config(no_env).unwrap();
        assert_eq!(config.spinner.interval_ms, 50);
        assert!(config.ci);

        let path = file.path().to_string_lossy().into_owned();
        let from_env = run_opts(&["true"])
            .load_config(|key| match key {
                ENV_CONFIG => Some(path.clone()),
                "NO_COLOR" => Some(String::new()),
                _ => None,
            })
            .unwrap();
        assert_eq!(from_env.spinner.interval_ms, 50);
        assert!(from_env.monochrome);
        assert!(!from_env.ci);
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let opts = Opts {
            config: Some(PathBuf::from("/nonexistent/readout.json")),
            ..run_opts(&["true"])
        };
        let err = opts.load_config(no_env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn request_carries_options() {
        let opts = run_opts(&["--label", "L", "--no-spinner", "--detail", "make", "all"]);
        let request = opts.request(StopSignal::never());
        assert_eq!(request.label.as_deref(), Some("L"));
        assert!(!request.spinner);
        assert!(request.detail);
        assert_eq!(request.args, vec!["all"]);
        assert!(request.stop.is_some());
    }

    #[test]
    fn help_text_mentions_every_flag() {
        for flag in ["--label", "--ci", "--no-spinner", "--detail", "--config"] {
            assert!(HELP_TEXT.contains(flag), "{flag}");
        }
    }
}
