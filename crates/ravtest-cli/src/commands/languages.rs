//! The `languages` command

use colored::Colorize;
use ravtest_manifest::DefaultManifest;

use crate::error::Result;

/// List the languages of the built-in defaults with their marker globs.
pub fn run_languages() -> Result<()> {
    let defaults = DefaultManifest::builtin()?;
    for (name, detect) in language_table(defaults) {
        println!("{:<10} {}", name.bold(), detect);
    }
    Ok(())
}

fn language_table(defaults: &DefaultManifest) -> Vec<(String, String)> {
    defaults
        .languages()
        .map(|language| (language.name.clone(), language.detect.join(", ")))
        .collect()
}
