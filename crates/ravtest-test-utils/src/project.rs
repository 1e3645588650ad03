//! [`TestProject`] builder for ravtest test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name of the project manifest, as ravtest looks for it.
pub const MANIFEST_FILENAME: &str = ".ravello.yml";

/// A temporary project directory with helper methods for test setup.
///
/// # Example
///
/// ```rust,no_run
/// use ravtest_test_utils::TestProject;
///
/// let project = TestProject::new()
///     .with_marker("setup.py")
///     .with_manifest("applications: []\n");
/// assert!(project.manifest_path().exists());
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary project directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the project root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the project's `.ravello.yml`, whether or not it exists yet.
    pub fn manifest_path(&self) -> PathBuf {
        self.root().join(MANIFEST_FILENAME)
    }

    /// Write `content` as the project manifest.
    pub fn write_manifest(&self, content: &str) -> &Self {
        fs::write(self.manifest_path(), content).unwrap();
        self
    }

    /// Create an empty marker file, such as `setup.py` or `pom.xml`.
    pub fn add_marker(&self, name: &str) -> &Self {
        self.write_file(name, "")
    }

    /// Write a file below the project root, creating parent directories.
    pub fn write_file(&self, path: &str, content: &str) -> &Self {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|_| panic!("Could not write file: {}", full_path.display()));
        self
    }

    /// Builder form of [`write_manifest`](Self::write_manifest).
    pub fn with_manifest(self, content: &str) -> Self {
        self.write_manifest(content);
        self
    }

    /// Builder form of [`add_marker`](Self::add_marker).
    pub fn with_marker(self, name: &str) -> Self {
        self.add_marker(name);
        self
    }
}
