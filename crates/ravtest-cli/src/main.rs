//! ravtest CLI
//!
//! Diagnostics for ravtest project manifests.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: cannot set up logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} manifest diagnostics", "ravtest".green().bold());
            println!();
            println!("Run {} for available commands.", "ravtest --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Lint {
            dump,
            json,
            project,
        } => commands::run_lint(&project, dump, json),
        Commands::Plan {
            application,
            command,
            project,
        } => commands::run_plan(&project, application.as_deref(), command.as_deref()),
        Commands::Languages => commands::run_languages(),
    }
}
