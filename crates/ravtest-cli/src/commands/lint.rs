//! The `lint` command

use colored::Colorize;
use ravtest_manifest::ExpandedManifest;
use ravtest_tasks::TaskRegistry;

use super::resolve_project;
use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};

/// Check the project manifest and print `OK` or the expanded manifest.
pub fn run_lint(project: &ProjectArgs, dump: bool, json: bool) -> Result<()> {
    let expanded = resolve_project(project, None)?;
    check_classes(&expanded, &TaskRegistry::with_builtins())?;

    if json {
        println!("{}", expanded.to_json()?);
    } else if dump {
        print!("{}", expanded.to_yaml()?);
    } else {
        println!("{}", "OK".green().bold());
    }
    Ok(())
}

/// Fail with every task whose class has no registered handler.
fn check_classes(expanded: &ExpandedManifest, registry: &TaskRegistry) -> Result<()> {
    let errors = registry.check(expanded);
    if errors.is_empty() {
        return Ok(());
    }
    let noun = if errors.len() == 1 { "error" } else { "errors" };
    let mut message = format!("manifest has {} {}:", errors.len(), noun);
    for error in &errors {
        message.push_str(&format!("\n  - {}", error));
    }
    Err(CliError::user(message))
}
