//! The user's project manifest
//!
//! A [`UserManifest`] is the untrusted, unchecked YAML document as written by
//! the user. Parsing only checks YAML syntax; the schema is checked during
//! resolution so that every problem is reported at once.

use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::model::Language;

/// File name of the project manifest
pub const MANIFEST_FILENAME: &str = ".ravello.yml";

/// A raw project manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct UserManifest {
    root: Value,
}

impl UserManifest {
    /// Parse a manifest from YAML content.
    ///
    /// # Example
    ///
    /// ```
    /// use ravtest_manifest::{Language, UserManifest};
    ///
    /// let manifest = UserManifest::parse("language: python\napplications: []\n").unwrap();
    /// assert_eq!(manifest.language(), Some(Language::named("python")));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)?;
        Ok(Self { root })
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The explicit `language:` of the manifest, if it has a usable one.
    pub fn language(&self) -> Option<Language> {
        self.root
            .get("language")
            .and_then(Value::as_str)
            .map(Language::named)
    }

    pub(crate) fn value(&self) -> &Value {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_document_is_accepted() {
        let manifest = UserManifest::parse("").unwrap();
        assert_eq!(manifest.language(), None);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = UserManifest::parse("applications: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn explicit_nodefaults_is_read() {
        let manifest = UserManifest::parse("language: nodefaults\n").unwrap();
        assert_eq!(manifest.language(), Some(Language::NoDefaults));
    }

    #[test]
    fn missing_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILENAME);
        let err = UserManifest::from_path(&path).unwrap_err();
        assert!(err.to_string().contains(".ravello.yml"));
    }
}
