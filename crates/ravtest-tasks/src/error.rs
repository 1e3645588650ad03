//! Error types for ravtest-tasks

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("virtual machine '{vm}', task '{task}': no handler registered for class '{class}'")]
    UnknownClass {
        vm: String,
        task: String,
        class: String,
    },

    #[error("task '{task}' has invalid options: {reason}")]
    InvalidOptions { task: String, reason: String },

    #[error("task '{task}' failed: '{command}' exited with status {status}")]
    TaskFailed {
        task: String,
        command: String,
        status: i32,
    },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
