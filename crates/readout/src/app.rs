#![forbid(unsafe_code)]

//! One wrapped run, end to end: signals, live progress, capture, report.

use std::io::{self, Write};

use readout_core::{CognitiveLoadEstimator, Config};
use readout_runtime::{CommandRunner, StopSignal, write_report};

use crate::cli::Opts;
use crate::error::Result;

/// Run the command described by `opts` and return its exit code.
///
/// Progress and the report go to stdout. A closed stdout (`EPIPE`) while
/// writing the report is not an error; the exit code still reflects the
/// wrapped command.
pub fn execute(opts: &Opts, config: Config) -> Result<i32> {
    let (stop, trigger) = StopSignal::new();
    #[cfg(unix)]
    let _signals = readout_runtime::SignalGuard::install(trigger)?;
    #[cfg(not(unix))]
    drop(trigger);

    let estimator = CognitiveLoadEstimator::new(config.thresholds, config.cognitive_load);
    let runner = CommandRunner::from_config(config);
    let task = runner.run(opts.request(stop));

    let mut out = io::stdout().lock();
    match write_report(&mut out, &task, runner.classifier(), &estimator) {
        Ok(plan) => {
            tracing::debug!(verbosity = ?plan.verbosity, digest = plan.digest, "report written");
        }
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
        Err(err) => return Err(err.into()),
    }
    let _ = out.flush();

    Ok(task.exit_code().unwrap_or(1))
}
