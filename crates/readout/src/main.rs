#![forbid(unsafe_code)]

use std::env;
use std::io;
use std::process;

use readout::cli::{HELP_TEXT, Opts, Parsed, VERSION};
use tracing_subscriber::EnvFilter;

/// Log filter variable. Unset means no subscriber and no log output.
const ENV_LOG: &str = "READOUT_LOG";

fn init_logging() {
    let Ok(directives) = env::var(ENV_LOG) else {
        return;
    };
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> i32 {
    init_logging();

    let opts = match Opts::parse_from(env::args().skip(1)) {
        Ok(Parsed::Run(opts)) => opts,
        Ok(Parsed::Help) => {
            println!("{HELP_TEXT}");
            return 0;
        }
        Ok(Parsed::Version) => {
            println!("readout {VERSION}");
            return 0;
        }
        Err(err) => {
            eprintln!("readout: {err}");
            eprintln!("Run with --help for usage information.");
            return err.exit_code();
        }
    };

    let result = opts
        .load_config(|key| env::var(key).ok())
        .and_then(|config| readout::app::execute(&opts, config));
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("readout: {err}");
            err.exit_code()
        }
    }
}

fn main() {
    // Destructors (signal guard, progress cursor restore) run inside `run`.
    process::exit(run());
}
