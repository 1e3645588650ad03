//! The transport seam between handlers and VMs
//!
//! Handlers never open connections themselves. They describe what to run as
//! a [`CommandRequest`] and hand it to a [`CommandRunner`], which the
//! orchestrator provides: an SSH session in production, [`LocalRunner`] to
//! run a workflow on this machine, or [`RecordingRunner`] for a dry run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;

use crate::builtin::is_marker;
use crate::context::Target;
use crate::error::{Error, Result};

/// One command to run on a VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: String,

    /// User to run as; `None` runs as the login user
    pub user: Option<String>,

    /// Suppress the command's output
    pub quiet: bool,

    /// Directory to run in; `None` runs in the login's home
    pub workdir: Option<String>,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            user: None,
            quiet: false,
            workdir: None,
        }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn with_status(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs commands on, and copies files to, a target VM.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command. A non-zero exit is not an error at this level.
    async fn run(&self, target: &Target, request: &CommandRequest) -> Result<CommandOutput>;

    /// Copy the contents of the local directory `local` into `remote`.
    async fn upload(&self, target: &Target, local: &Path, remote: &str) -> Result<()>;
}

/// Runs commands with `sh -c` on this machine.
///
/// Remote directories map to directories below `base`. The target and the
/// requested user are ignored.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    base: PathBuf,
}

impl LocalRunner {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, remote: &str) -> PathBuf {
        self.base.join(remote.trim_start_matches("~/"))
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, target: &Target, request: &CommandRequest) -> Result<CommandOutput> {
        let dir = match &request.workdir {
            Some(workdir) => self.resolve(workdir),
            None => self.base.clone(),
        };
        tracing::debug!(%target, command = %request.command, ?dir, "Running command locally");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&request.command)
            .current_dir(&dir)
            .env("HOME", &self.base)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Transport {
                message: format!("cannot run '{}' in {}: {}", request.command, dir.display(), e),
            })?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn upload(&self, _target: &Target, local: &Path, remote: &str) -> Result<()> {
        let destination = self.resolve(remote);
        let mut pending = vec![(local.to_path_buf(), destination)];
        while let Some((from, to)) = pending.pop() {
            fs::create_dir_all(&to).await?;
            let mut entries = fs::read_dir(&from).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let target = to.join(entry.file_name());
                if entry.file_type().await?.is_dir() {
                    if path == self.base || self.base.starts_with(&path) {
                        continue;
                    }
                    pending.push((path, target));
                } else {
                    fs::copy(&path, &target).await?;
                }
            }
        }
        Ok(())
    }
}

/// One call received by a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Run(CommandRequest),
    Upload { local: PathBuf, remote: String },
}

/// Records every call instead of executing it.
///
/// The recorder behaves like a freshly booted VM: every command succeeds,
/// except a `test -f` probe for a sysinit marker, which only succeeds once
/// `touch` created that marker. Specific commands can be made to fail with
/// [`fail_on`](Self::fail_on).
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Recorded>>,
    touched: Mutex<HashSet<String>>,
    failures: Vec<(String, i32)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` exit with `status`.
    pub fn fail_on(mut self, command: impl Into<String>, status: i32) -> Self {
        self.failures.push((command.into(), status));
        self
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The commands run so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Recorded::Run(request) => Some(request.command),
                Recorded::Upload { .. } => None,
            })
            .collect()
    }

    fn status(&self, command: &str) -> i32 {
        if let Some((_, status)) = self.failures.iter().find(|(c, _)| c == command) {
            return *status;
        }
        let mut touched = self.touched.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(file) = command.strip_prefix("touch ").map(str::trim) {
            if is_marker(file) {
                touched.insert(file.to_string());
            }
        } else if let Some(file) = command.strip_prefix("test -f ").map(str::trim) {
            if is_marker(file) && !touched.contains(file) {
                return 1;
            }
        }
        0
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, _target: &Target, request: &CommandRequest) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Recorded::Run(request.clone()));
        Ok(CommandOutput::with_status(self.status(&request.command)))
    }

    async fn upload(&self, _target: &Target, local: &Path, remote: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Recorded::Upload {
                local: local.to_path_buf(),
                remote: remote.to_string(),
            });
        Ok(())
    }
}
