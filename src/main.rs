//! bbupdate CLI - Broadband Provider Coverage Dataset Updater
//!
//! Command-line entry point for the update workflow.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use bbupdate::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("bbupdate v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd)?,
        None => {
            println!("bbupdate v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
        }
    }

    Ok(())
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Run(args) => commands::run(&args)?,
        Commands::AssignIds { dataset, random } => commands::assign_ids(&dataset, random)?,
        Commands::Show { layer, provider } => commands::show(&layer, provider.as_deref())?,
    }
    Ok(())
}
