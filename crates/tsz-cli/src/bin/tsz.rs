#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;

use tsz_cli::args::CliArgs;
use tsz_cli::driver;

fn main() -> Result<()> {
    // Initialize tracing if TSZ_LOG or RUST_LOG is set (zero cost otherwise).
    // Supports TSZ_LOG_FORMAT=tree|json|text.
    tsz_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = match driver::run(&args, &cwd, &mut out) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            driver::EXIT_DIAGNOSTICS_OUTPUTS_SKIPPED
        }
    };
    drop(out);
    std::process::exit(code);
}
