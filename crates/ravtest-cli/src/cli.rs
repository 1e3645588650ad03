//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ravtest - Run your project's tests on Ravello virtual machines
#[derive(Parser, Debug)]
#[command(name = "ravtest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where to find the project and its manifest
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ProjectArgs {
    /// Project directory
    #[arg(short = 'C', long = "dir", default_value = ".")]
    pub dir: PathBuf,

    /// Manifest file (defaults to <dir>/.ravello.yml)
    #[arg(short, long, env = "RAVTEST_MANIFEST")]
    pub manifest: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check the project manifest
    ///
    /// Resolves the manifest against the built-in defaults and reports
    /// every problem found.
    ///
    /// Examples:
    ///   ravtest lint                 # Check ./.ravello.yml
    ///   ravtest lint --dump          # Print the expanded manifest
    ///   ravtest lint --dump --json   # ... as JSON
    Lint {
        /// Print the expanded manifest instead of "OK"
        #[arg(long)]
        dump: bool,

        /// Print the expanded manifest as JSON (implies --dump)
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Show the commands each VM would run, without running them
    Plan {
        /// Only this application
        application: Option<String>,

        /// Run this command instead of the manifest's workflow
        command: Option<String>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// List the languages with built-in defaults
    Languages,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lint_flags() {
        let cli = Cli::try_parse_from(["ravtest", "-v", "lint", "--dump", "-C", "proj"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Some(Commands::Lint {
                dump: true,
                json: false,
                project: ProjectArgs {
                    dir: PathBuf::from("proj"),
                    manifest: None,
                },
            })
        );
    }

    #[test]
    fn test_plan_positionals() {
        let cli = Cli::try_parse_from(["ravtest", "plan", "unittest", "make check"]).unwrap();
        match cli.command {
            Some(Commands::Plan {
                application,
                command,
                ..
            }) => {
                assert_eq!(application.as_deref(), Some("unittest"));
                assert_eq!(command.as_deref(), Some("make check"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
