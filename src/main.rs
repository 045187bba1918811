// RUST LEARNING: The binary is a thin shell around the library crate
// - `build_deploy` is our own crate (defined in lib.rs)
// - Argument normalization happens before clap sees anything
use build_deploy::cli::runner::run_deploy;
use build_deploy::cli::{init_logging, print_banner};
use build_deploy::config::{resolve_args, DeployConfig, DEPLOY_DEFAULTS_FILE};
use build_deploy::EventLog;
use clap::Parser;
use colored::Colorize;
use std::env;

fn main() -> anyhow::Result<()> {
    let args = resolve_args(env::args(), DEPLOY_DEFAULTS_FILE)?;
    let config = DeployConfig::parse_from(args);

    init_logging(config.verbose);
    print_banner("Build.Deploy.Util");

    let event_log = EventLog::from_option(config.event_log.clone());
    let result = run_deploy(&config, &event_log);

    // RUST LEARNING: `if let` borrows the error so `result` can still be inspected below
    if let Err(err) = &result {
        eprintln!("{} {}", "Error:".red(), err);
        event_log.add_error(err);
    }

    println!("{}", "Build.Deploy.Util Complete".bold());

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
