//! Error types for ravtest-manifest

use std::fmt;
use std::path::PathBuf;

/// Result type for ravtest-manifest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or resolving a manifest
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Manifest file not found at expected path
    #[error("Project manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    /// The document is not valid YAML
    #[error("Illegal YAML in manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The embedded or supplied default manifest does not pass validation
    #[error("Invalid default manifest: {message}")]
    InvalidDefaults { message: String },

    /// One or more validation errors found while resolving the manifest
    #[error(transparent)]
    Resolution(#[from] ResolutionErrors),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Where a duplicated name was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameScope {
    /// Application names within the manifest
    Application,
    /// VM names within one application
    VirtualMachine { application: String },
    /// Task names within one VM
    Task { vm: String },
}

impl fmt::Display for NameScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameScope::Application => write!(f, "application"),
            NameScope::VirtualMachine { application } => {
                write!(f, "virtual machine in application '{}'", application)
            }
            NameScope::Task { vm } => write!(f, "task in virtual machine '{}'", vm),
        }
    }
}

/// A single problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// The same name is declared twice in one scope
    #[error("duplicate {scope} name '{name}' at {first} and {second}")]
    DuplicateName {
        scope: NameScope,
        name: String,
        first: String,
        second: String,
    },

    /// A VM of a from-scratch application has no image
    #[error(
        "application '{application}': virtual machine '{vm}' does not specify an image \
         and the application has no blueprint"
    )]
    MissingImage { application: String, vm: String },

    /// A task definition is malformed
    #[error("virtual machine '{vm}', task '{task}': {reason}")]
    InvalidTaskSpec {
        vm: String,
        task: String,
        reason: String,
    },

    /// A key that the schema does not know
    #[error("unknown key '{key}' in {path}")]
    UnknownKey { path: String, key: String },

    /// Required field is absent
    #[error("{path}: missing required field '{field}'")]
    MissingField { path: String, field: String },

    /// A field has the wrong type or an out-of-range value
    #[error("{path}: {reason}")]
    InvalidValue { path: String, reason: String },

    /// An application without virtual machines
    #[error("application '{application}' does not define any virtual machines")]
    EmptyVms { application: String },

    /// More than one language matched the project; not fatal
    #[error("project matches several languages ({}); using no language defaults", .candidates.join(", "))]
    LanguageDetectionAmbiguous { candidates: Vec<String> },
}

/// All errors collected during one resolution pass.
///
/// Resolution never stops at the first problem; every error found is
/// reported together so a manifest can be fixed in one go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolutionErrors(Vec<ResolutionError>);

impl ResolutionErrors {
    pub fn new(errors: Vec<ResolutionError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolutionError> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ResolutionError> {
        self.0
    }
}

impl fmt::Display for ResolutionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "error" } else { "errors" };
        write!(f, "manifest has {} {}:", self.0.len(), noun)?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionErrors {}

impl IntoIterator for ResolutionErrors {
    type Item = ResolutionError;
    type IntoIter = std::vec::IntoIter<ResolutionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolutionErrors {
    type Item = &'a ResolutionError;
    type IntoIter = std::slice::Iter<'a, ResolutionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
