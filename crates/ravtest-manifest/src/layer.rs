//! Manifest layers and their merge rules
//!
//! A layer is one partially specified source of configuration: the global
//! defaults, a language's defaults, or the user's manifest. Every field is
//! optional so that a layer only overrides what it actually states. Layers
//! are merged lowest precedence first; [`merge`](ApplicationLayer::merge)
//! always lets the `other` layer win.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{Language, Service};

/// Task fields as declared in one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskLayer {
    pub name: String,
    pub class: Option<String>,
    pub commands: Option<Vec<String>>,
    pub user: Option<String>,
    pub quiet: Option<bool>,
    pub options: BTreeMap<String, Value>,

    /// Source location, used in error messages
    pub path: String,
}

impl TaskLayer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Override the fields `other` declares; keep the rest.
    pub fn merge(&mut self, other: &TaskLayer) {
        if other.class.is_some() {
            self.class = other.class.clone();
        }
        if other.commands.is_some() {
            self.commands = other.commands.clone();
        }
        if other.user.is_some() {
            self.user = other.user.clone();
        }
        if other.quiet.is_some() {
            self.quiet = other.quiet;
        }
        for (key, value) in &other.options {
            match self.options.get_mut(key) {
                Some(existing) => merge_option(existing, value),
                None => {
                    self.options.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

/// Merge `overlay` into `base` by task name.
///
/// A task whose name already exists is overridden field by field and keeps
/// its position. New names are appended in overlay order.
pub fn merge_tasks(base: &mut Vec<TaskLayer>, overlay: &[TaskLayer]) {
    for task in overlay {
        match base.iter_mut().find(|existing| existing.name == task.name) {
            Some(existing) => existing.merge(task),
            None => base.push(task.clone()),
        }
    }
}

/// VM fields as declared in one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VmLayer {
    pub name: Option<String>,
    pub image: Option<String>,
    pub smp: Option<u32>,
    pub memory: Option<u32>,
    pub services: Option<Vec<Service>>,
    pub tasks: Option<Vec<TaskLayer>>,

    /// Short-hand task keys, in source order
    pub shorthand: Vec<TaskLayer>,

    pub path: String,
}

impl VmLayer {
    /// Merge another VM layer into this one.
    ///
    /// Scalars and `services` are replaced when `other` declares them.
    /// `tasks` merge by name via [`merge_tasks`]. Short-hand keys are not
    /// merged here; they are applied once, after all layers.
    pub fn merge(&mut self, other: &VmLayer) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.image.is_some() {
            self.image = other.image.clone();
        }
        if other.smp.is_some() {
            self.smp = other.smp;
        }
        if other.memory.is_some() {
            self.memory = other.memory;
        }
        if other.services.is_some() {
            self.services = other.services.clone();
        }
        if let Some(other_tasks) = &other.tasks {
            let tasks = self.tasks.get_or_insert_with(Vec::new);
            merge_tasks(tasks, other_tasks);
        }
    }
}

/// Application fields as declared in one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationLayer {
    pub name: Option<String>,
    pub blueprint: Option<String>,
    pub keepalive: Option<u32>,
    pub vms: Option<Vec<VmLayer>>,
    pub path: String,
}

impl ApplicationLayer {
    /// Merge the scalar fields of `other` into this layer.
    ///
    /// VMs are never merged across layers: defaults describe every VM, not
    /// a list of VMs, and are applied per VM during expansion.
    pub fn merge(&mut self, other: &ApplicationLayer) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.blueprint.is_some() {
            self.blueprint = other.blueprint.clone();
        }
        if other.keepalive.is_some() {
            self.keepalive = other.keepalive;
        }
    }
}

/// The user manifest after schema checking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestLayer {
    pub language: Option<Language>,
    pub applications: Vec<ApplicationLayer>,
}

/// Option tables merge key by key; any other value is replaced.
fn merge_option(base: &mut Value, overlay: &Value) {
    if let (Value::Object(table), Value::Object(entries)) = (&mut *base, overlay) {
        for (key, value) in entries {
            match table.get_mut(key) {
                Some(existing) => merge_option(existing, value),
                None => {
                    table.insert(key.clone(), value.clone());
                }
            }
        }
        return;
    }
    *base = overlay.clone();
}
