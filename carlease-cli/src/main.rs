//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CARLEASE_LOG";

fn main() {
    init_logging();
    if let Err(err) = carlease_cli::run() {
        eprintln!("carlease: {err}");
        std::process::exit(1);
    }
}

/// Sends log records to stderr, filtered by `CARLEASE_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Only fails when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
