//! Task handler registry
//!
//! Manifests name a task's handler by class identifier. The registry maps
//! those identifiers to constructors, so code outside this crate can add
//! handler classes with [`TaskRegistry::register`].

use std::collections::HashMap;

use ravtest_manifest::{ExpandedManifest, SHELL_TASK_CLASS, Task, VirtualMachine};

use crate::builtin::{DEPLOY_TASK_CLASS, DeployTask, SYSINIT_TASK_CLASS, ShellTask, SysinitTask};
use crate::error::{Error, Result};
use crate::handler::TaskHandler;

/// Builds a handler from a resolved task.
pub type HandlerFactory = Box<dyn Fn(&Task) -> Result<Box<dyn TaskHandler>> + Send + Sync>;

/// Central registry of handler classes.
pub struct TaskRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl TaskRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the shell, sysinit and deploy handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(SHELL_TASK_CLASS, |task| Ok(Box::new(ShellTask::from_task(task))));
        registry.register(SYSINIT_TASK_CLASS, |task| {
            Ok(Box::new(SysinitTask::from_task(task)))
        });
        registry.register(DEPLOY_TASK_CLASS, |task| Ok(Box::new(DeployTask::from_task(task))));
        registry
    }

    /// Register a handler class, replacing any previous one.
    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn(&Task) -> Result<Box<dyn TaskHandler>> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Box::new(factory));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// List all registered class identifiers (sorted).
    pub fn list(&self) -> Vec<&str> {
        let mut classes: Vec<_> = self.factories.keys().map(|s| s.as_str()).collect();
        classes.sort();
        classes
    }

    /// Build the handler for one task of `vm`.
    pub fn build(&self, vm: &str, task: &Task) -> Result<Box<dyn TaskHandler>> {
        let factory = self
            .factories
            .get(&task.class)
            .ok_or_else(|| Error::UnknownClass {
                vm: vm.to_string(),
                task: task.name.clone(),
                class: task.class.clone(),
            })?;
        factory(task)
    }

    /// Build a VM's handlers in workflow order.
    pub fn build_vm(&self, vm: &VirtualMachine) -> Result<Vec<Box<dyn TaskHandler>>> {
        vm.tasks.iter().map(|task| self.build(&vm.name, task)).collect()
    }

    /// Every task in `manifest` whose class has no handler.
    pub fn check(&self, manifest: &ExpandedManifest) -> Vec<Error> {
        let mut errors = Vec::new();
        for vm in manifest.applications.iter().flat_map(|app| &app.vms) {
            for task in vm.tasks.iter().filter(|task| !self.contains(&task.class)) {
                errors.push(Error::UnknownClass {
                    vm: vm.name.clone(),
                    task: task.name.clone(),
                    class: task.class.clone(),
                });
            }
        }
        errors
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
