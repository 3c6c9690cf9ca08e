mod capture;
mod cli;
mod config;
mod core;
mod meta;
mod session;
mod sysname;
mod ui;

use clap::Parser;
use std::process;

use crate::cli::{Cli, Commands};
use crate::config::HostConfig;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();

    let config = match HostConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load host config: {}", e);
            process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Start { system, interface } => crate::core::start::run(&config, system, interface),
        Commands::Save { name } => crate::core::save::run(&config, name.as_deref()),
        Commands::Discard => crate::core::discard::run(&config),
        Commands::Stop { background } => crate::core::stop::run(&config, background),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
