//! ts-transpile: TypeScript to JavaScript transpiler.

mod cli;
mod config;
mod driver;
mod output;

use clap::Parser;
use cli::Args;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let summary = driver::run(args).into_diagnostic()?;
    if summary.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}

/// Logs to stderr so stdout only carries emitted code. `RUST_LOG` overrides
/// the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
