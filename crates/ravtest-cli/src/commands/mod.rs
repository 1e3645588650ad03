//! Command implementations for ravtest-cli

pub mod languages;
pub mod lint;
pub mod plan;

pub use languages::run_languages;
pub use lint::run_lint;
pub use plan::run_plan;

use std::path::PathBuf;

use ravtest_manifest::{DefaultManifest, ExpandedManifest, MANIFEST_FILENAME, Resolver};

use crate::cli::ProjectArgs;
use crate::error::Result;

impl ProjectArgs {
    /// The manifest path: `--manifest` if given, else `<dir>/.ravello.yml`.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.dir.join(MANIFEST_FILENAME))
    }
}

/// Read and resolve the project manifest.
///
/// The language is detected in the project directory, which need not be the
/// directory of an explicitly given manifest.
pub(crate) fn resolve_project(
    project: &ProjectArgs,
    command_override: Option<&str>,
) -> Result<ExpandedManifest> {
    let defaults = DefaultManifest::builtin()?;
    let mut resolver = Resolver::new(defaults);
    if let Some(command) = command_override {
        resolver = resolver.with_command_override(command);
    }

    let path = project.manifest_path();
    tracing::debug!(manifest = %path.display(), "Loading manifest");
    let manifest = ravtest_manifest::UserManifest::from_path(&path)?;
    let language = resolver.select_language(&manifest, &project.dir);
    Ok(resolver.resolve(&manifest, &language)?)
}
