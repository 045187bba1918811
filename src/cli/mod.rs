pub mod runner;
pub mod update_version;

use colored::Colorize;
use log::LevelFilter;

/// `RUST_LOG` is honoured; `/Verbose` forces debug output for this crate
pub fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_module("build_deploy", LevelFilter::Debug);
    }
    // Tests may initialise more than once
    let _ = builder.try_init();
}

pub fn print_banner(tool: &str) {
    println!(
        "{} {}",
        tool.bold(),
        format!("v{}", crate::VERSION).dimmed()
    );
}
