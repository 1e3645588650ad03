//! Execution context for task handlers

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use ravtest_manifest::{Application, Language, VirtualMachine};

use crate::runner::CommandRunner;

/// Login used on freshly provisioned VMs
pub const DEFAULT_USER: &str = "ravello";

/// Remote directory the project is deployed to, relative to the login's home
pub const DEFAULT_WORKDIR: &str = "ravtest";

/// Where a VM is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl Target {
    /// A target on the SSH port with the default login.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: DEFAULT_USER.to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Everything a handler knows about the VM it runs on.
///
/// A context is built once per VM and never changes while that VM's
/// workflow runs.
#[derive(Clone)]
pub struct ExecutionContext {
    pub application: String,
    pub vm: String,
    pub keepalive: u32,
    pub language: Language,
    pub target: Target,

    /// Remote working directory of the deployed project
    pub workdir: String,

    /// Local project directory that `DeployTask` uploads
    pub project_root: PathBuf,

    runner: Arc<dyn CommandRunner>,
}

impl ExecutionContext {
    pub fn new(
        application: &Application,
        vm: &VirtualMachine,
        language: Language,
        target: Target,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            application: application.name.clone(),
            vm: vm.name.clone(),
            keepalive: application.keepalive,
            language,
            target,
            workdir: DEFAULT_WORKDIR.to_string(),
            project_root: PathBuf::from("."),
            runner,
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Substitute `{application}`, `{vm}`, `{workdir}`, `{keepalive}` and
    /// `{language}` in a manifest command.
    pub fn expand(&self, command: &str) -> String {
        command
            .replace("{application}", &self.application)
            .replace("{vm}", &self.vm)
            .replace("{workdir}", &self.workdir)
            .replace("{keepalive}", &self.keepalive.to_string())
            .replace("{language}", &self.language.to_string())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("application", &self.application)
            .field("vm", &self.vm)
            .field("keepalive", &self.keepalive)
            .field("language", &self.language)
            .field("target", &self.target)
            .field("workdir", &self.workdir)
            .field("project_root", &self.project_root)
            .finish_non_exhaustive()
    }
}
