//! The expanded manifest tree
//!
//! These types are the output of resolution: every default applied, every
//! short-hand key expanded. They are plain data and carry no behaviour beyond
//! lookups and serialization, so the orchestrator and the `--dump` output see
//! exactly the same structure.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Language token meaning "apply no language-specific defaults".
pub const NODEFAULTS: &str = "nodefaults";

/// Handler class used when a task does not name one.
pub const SHELL_TASK_CLASS: &str = "ravtest.tasks.ShellTask";

/// Keepalive used when neither the manifest nor the defaults provide one.
pub const FALLBACK_KEEPALIVE: u32 = 90;

/// The language whose defaults are merged into a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    /// No language-specific defaults
    #[default]
    NoDefaults,
    /// A language defined in the default manifest, e.g. "python"
    Named(String),
}

impl Language {
    pub fn named(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    /// The language name, or `None` for [`Language::NoDefaults`].
    pub fn name(&self) -> Option<&str> {
        match self {
            Language::NoDefaults => None,
            Language::Named(name) => Some(name),
        }
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NODEFAULTS) {
            Language::NoDefaults
        } else {
            Language::Named(trimmed.to_lowercase())
        }
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.to_string()
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Language::from(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::NoDefaults => write!(f, "{}", NODEFAULTS),
            Language::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A fully resolved manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedManifest {
    /// Language whose defaults were applied
    pub language: Language,

    /// Applications in manifest order
    pub applications: Vec<Application>,
}

impl ExpandedManifest {
    /// Look up an application by name
    pub fn application(&self, name: &str) -> Option<&Application> {
        self.applications.iter().find(|app| app.name == name)
    }

    /// Render the manifest as YAML, mirroring the input schema
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Render the manifest as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One application: a set of VMs started together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,

    /// Blueprint the application is created from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,

    /// Minutes the application stays up after the run
    pub keepalive: u32,

    pub vms: Vec<VirtualMachine>,
}

impl Application {
    /// Look up a VM by name
    pub fn vm(&self, name: &str) -> Option<&VirtualMachine> {
        self.vms.iter().find(|vm| vm.name == name)
    }
}

/// One virtual machine and its ordered workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Number of CPUs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smp: Option<u32>,

    /// Memory in MiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    pub tasks: Vec<Task>,
}

impl VirtualMachine {
    /// Look up a task by name
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    /// Task names in execution order
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }
}

/// A network service exposed by a VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub port: u16,
}

/// One step of a VM workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,

    /// Handler identifier, e.g. `ravtest.tasks.ShellTask`
    pub class: String,

    pub commands: Vec<String>,

    /// User the commands run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    pub quiet: bool,

    /// Extra keys handed to the handler as its state
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl Task {
    /// Look up a handler option
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}
