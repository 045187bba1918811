use build_deploy::cli::update_version::run_update_version;
use build_deploy::cli::{init_logging, print_banner};
use build_deploy::config::{resolve_args, UpdateVersionConfig, UPDATE_VERSION_DEFAULTS_FILE};
use build_deploy::EventLog;
use clap::Parser;
use colored::Colorize;
use std::env;

fn main() -> anyhow::Result<()> {
    let args = resolve_args(env::args(), UPDATE_VERSION_DEFAULTS_FILE)?;
    let config = UpdateVersionConfig::parse_from(args);

    init_logging(config.verbose);
    print_banner("UpdateVersion");

    let event_log = EventLog::from_option(config.event_log.clone());
    if let Err(err) = run_update_version(&config, &event_log) {
        eprintln!("{} {}", "Error:".red(), err);
        event_log.add_error(&err);
        std::process::exit(1);
    }

    Ok(())
}
