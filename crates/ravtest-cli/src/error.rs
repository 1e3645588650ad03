//! Error types for ravtest-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from ravtest-manifest
    #[error(transparent)]
    Manifest(#[from] ravtest_manifest::Error),

    /// Error from ravtest-tasks
    #[error(transparent)]
    Tasks(#[from] ravtest_tasks::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

impl From<ravtest_manifest::ResolutionErrors> for CliError {
    fn from(errors: ravtest_manifest::ResolutionErrors) -> Self {
        Self::Manifest(errors.into())
    }
}
