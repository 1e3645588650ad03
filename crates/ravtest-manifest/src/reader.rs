//! Schema checking for manifest documents
//!
//! `serde` derive stops at the first bad field, but a manifest should report
//! all of its problems at once. The [`Reader`] walks the raw YAML tree
//! instead, turning what it can into layers and recording an error for
//! everything it cannot.

use std::collections::BTreeSet;

use serde_yaml::{Mapping, Value};

use crate::error::ResolutionError;
use crate::layer::{ApplicationLayer, ManifestLayer, TaskLayer, VmLayer};
use crate::model::{Language, Service};
use crate::services;

/// Path label of the document root
pub(crate) const ROOT: &str = "manifest";

/// Which kind of document a section comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// The user's project manifest
    User,
    /// A `defaults` or `languages.<lang>` section of the default manifest
    Defaults,
}

pub(crate) struct Reader<'a> {
    shorthand: &'a BTreeSet<String>,
    errors: Vec<ResolutionError>,
}

impl<'a> Reader<'a> {
    /// `shorthand` lists the VM keys that expand into tasks.
    pub fn new(shorthand: &'a BTreeSet<String>) -> Self {
        Self {
            shorthand,
            errors: Vec::new(),
        }
    }

    pub fn finish(self) -> Vec<ResolutionError> {
        self.errors
    }

    pub fn push(&mut self, error: ResolutionError) {
        self.errors.push(error);
    }

    /// Read a user manifest document.
    pub fn manifest(&mut self, root: &Value) -> ManifestLayer {
        let mut layer = ManifestLayer::default();
        let Some(map) = self.mapping(root, ROOT) else {
            return layer;
        };

        for (key, value) in self.entries(map, ROOT) {
            match key {
                "language" => {
                    layer.language = self.string(value, "language").map(Language::from);
                }
                "applications" => {
                    let Some(items) = self.sequence(value, "applications") else {
                        continue;
                    };
                    for (index, item) in items.iter().enumerate() {
                        let path = format!("applications[{}]", index);
                        if let Some(app) = self.application(item, path, Origin::User) {
                            layer.applications.push(app);
                        }
                    }
                }
                other => self.unknown(ROOT, other),
            }
        }
        layer
    }

    pub fn application(
        &mut self,
        value: &Value,
        path: String,
        origin: Origin,
    ) -> Option<ApplicationLayer> {
        let map = self.mapping(value, &path)?;
        let mut app = ApplicationLayer {
            path: path.clone(),
            ..ApplicationLayer::default()
        };

        for (key, value) in self.entries(map, &path) {
            let field = child(&path, key);
            match (key, origin) {
                ("name", Origin::User) => app.name = self.text(value, &field),
                ("blueprint", _) => app.blueprint = self.text(value, &field),
                ("keepalive", _) => app.keepalive = self.positive(value, &field),
                ("vms", Origin::User) => {
                    let Some(items) = self.sequence(value, &field) else {
                        continue;
                    };
                    let mut vms = Vec::new();
                    for (index, item) in items.iter().enumerate() {
                        let vm_path = format!("{}[{}]", field, index);
                        if let Some(vm) = self.vm(item, vm_path, origin) {
                            vms.push(vm);
                        }
                    }
                    app.vms = Some(vms);
                }
                (other, _) => self.unknown(&path, other),
            }
        }
        Some(app)
    }

    pub fn vm(&mut self, value: &Value, path: String, origin: Origin) -> Option<VmLayer> {
        let map = self.mapping(value, &path)?;
        let mut vm = VmLayer {
            path: path.clone(),
            ..VmLayer::default()
        };

        // The VM name labels task errors, so read it before anything else.
        if origin == Origin::User {
            if let Some(name) = map.get("name") {
                vm.name = self.text(name, &child(&path, "name"));
            }
        }
        let label = match (&vm.name, origin) {
            (Some(name), _) => name.clone(),
            (None, Origin::Defaults) => "defaults".to_string(),
            (None, Origin::User) => path.clone(),
        };

        for (key, value) in self.entries(map, &path) {
            let field = child(&path, key);
            match (key, origin) {
                ("name", Origin::User) => {}
                // A blank image is no image; validation reports it as missing.
                ("image", _) => {
                    vm.image = self
                        .string(value, &field)
                        .filter(|image| !image.trim().is_empty());
                }
                ("smp", _) => vm.smp = self.positive(value, &field),
                ("memory", _) => vm.memory = self.positive(value, &field),
                ("services", _) => vm.services = self.services(value, &field),
                ("tasks", _) => vm.tasks = self.task_list(value, &label, &field),
                (other, _) if self.shorthand.contains(other) => {
                    if let Some(task) = self.shorthand_task(other, value, &label, &field) {
                        vm.shorthand.push(task);
                    }
                }
                (other, _) => self.unknown(&path, other),
            }
        }
        Some(vm)
    }

    fn task_list(&mut self, value: &Value, vm: &str, path: &str) -> Option<Vec<TaskLayer>> {
        let items = self.sequence(value, path)?;
        let mut tasks = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let task_path = format!("{}[{}]", path, index);
            let Some(map) = item.as_mapping() else {
                self.push(ResolutionError::InvalidTaskSpec {
                    vm: vm.to_string(),
                    task: format!("#{}", index + 1),
                    reason: format!("{} must be a mapping of task fields", task_path),
                });
                continue;
            };
            let name = match map.get("name") {
                Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
                Some(_) => {
                    self.push(ResolutionError::InvalidValue {
                        path: child(&task_path, "name"),
                        reason: "task name must be a non-empty string".to_string(),
                    });
                    continue;
                }
                None => {
                    self.push(ResolutionError::MissingField {
                        path: task_path,
                        field: "name".to_string(),
                    });
                    continue;
                }
            };
            let task = TaskLayer {
                path: task_path,
                ..TaskLayer::named(name)
            };
            tasks.push(self.task_fields(map, task, vm));
        }
        Some(tasks)
    }

    fn shorthand_task(
        &mut self,
        key: &str,
        value: &Value,
        vm: &str,
        path: &str,
    ) -> Option<TaskLayer> {
        let task = TaskLayer {
            path: path.to_string(),
            ..TaskLayer::named(key)
        };
        match value {
            // `execute:` with no value declares the task without overriding it.
            Value::Null => Some(task),
            Value::String(class) if class.trim().is_empty() => {
                self.invalid_task(vm, key, "short-hand class must not be empty");
                None
            }
            Value::String(class) => Some(TaskLayer {
                class: Some(class.clone()),
                ..task
            }),
            Value::Sequence(_) => {
                let commands = self.commands(value, vm, key, key)?;
                Some(TaskLayer {
                    commands: Some(commands),
                    ..task
                })
            }
            Value::Mapping(map) => {
                if let Some(name) = map.get("name") {
                    if name.as_str() != Some(key) {
                        self.push(ResolutionError::InvalidTaskSpec {
                            vm: vm.to_string(),
                            task: key.to_string(),
                            reason: "a short-hand task cannot be renamed".to_string(),
                        });
                        return None;
                    }
                }
                Some(self.task_fields(map, task, vm))
            }
            _ => {
                self.push(ResolutionError::InvalidTaskSpec {
                    vm: vm.to_string(),
                    task: key.to_string(),
                    reason: "short-hand value must be a class name, a list of commands or a mapping of task fields"
                        .to_string(),
                });
                None
            }
        }
    }

    fn task_fields(&mut self, map: &Mapping, mut task: TaskLayer, vm: &str) -> TaskLayer {
        let task_path = task.path.clone();
        let mut seen_command_key: Option<&str> = None;

        for (key, value) in self.entries(map, &task_path) {
            match key {
                "name" => {}
                "class" => match value.as_str() {
                    Some(class) => task.class = Some(class.to_string()),
                    None => self.invalid_task(vm, &task.name, "'class' must be a string"),
                },
                "command" | "commands" => {
                    if let Some(previous) = seen_command_key {
                        let reason = format!("declares both '{}' and '{}'", previous, key);
                        self.invalid_task(vm, &task.name, &reason);
                        continue;
                    }
                    seen_command_key = Some(key);
                    let name = task.name.clone();
                    task.commands = self.commands(value, vm, &name, key);
                }
                "user" => match value.as_str() {
                    Some(user) => task.user = Some(user.to_string()),
                    None => self.invalid_task(vm, &task.name, "'user' must be a string"),
                },
                "quiet" => match value.as_bool() {
                    Some(quiet) => task.quiet = Some(quiet),
                    None => self.invalid_task(vm, &task.name, "'quiet' must be true or false"),
                },
                other => match serde_json::to_value(value) {
                    Ok(json) => {
                        task.options.insert(other.to_string(), json);
                    }
                    Err(e) => {
                        let reason = format!("option '{}' cannot be represented: {}", other, e);
                        self.invalid_task(vm, &task.name, &reason);
                    }
                },
            }
        }
        task
    }

    fn commands(&mut self, value: &Value, vm: &str, task: &str, key: &str) -> Option<Vec<String>> {
        let reason = format!("'{}' must be a list of strings", key);
        let Some(items) = value.as_sequence() else {
            self.invalid_task(vm, task, &reason);
            return None;
        };
        let mut commands = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(command) => commands.push(command.to_string()),
                None => {
                    self.invalid_task(vm, task, &reason);
                    return None;
                }
            }
        }
        Some(commands)
    }

    fn services(&mut self, value: &Value, path: &str) -> Option<Vec<Service>> {
        let items = self.sequence(value, path)?;
        let mut services = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", path, index);
            match item {
                Value::Number(n) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                    Some(port) if port > 0 => services.push(services::from_port(port)),
                    _ => self.push(ResolutionError::InvalidValue {
                        path: item_path,
                        reason: format!("port {} is out of range 1-65535", n),
                    }),
                },
                Value::String(name) => match services::from_name(name) {
                    Some(service) => services.push(service),
                    None => self.push(ResolutionError::InvalidValue {
                        path: item_path,
                        reason: format!("unknown service '{}'", name),
                    }),
                },
                _ => self.push(ResolutionError::InvalidValue {
                    path: item_path,
                    reason: "service must be a port number or a service name".to_string(),
                }),
            }
        }
        Some(services)
    }

    // Scalar and container helpers. Each returns `None` after recording an
    // error, or when the value is YAML null (treated as "not declared").

    pub fn mapping<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Mapping> {
        match value {
            Value::Mapping(map) => Some(map),
            Value::Null => None,
            _ => {
                self.push(ResolutionError::InvalidValue {
                    path: path.to_string(),
                    reason: "expected a mapping".to_string(),
                });
                None
            }
        }
    }

    fn sequence<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Vec<Value>> {
        match value {
            Value::Sequence(items) => Some(items),
            Value::Null => None,
            _ => {
                self.push(ResolutionError::InvalidValue {
                    path: path.to_string(),
                    reason: "expected a list".to_string(),
                });
                None
            }
        }
    }

    pub fn string(&mut self, value: &Value, path: &str) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            _ => {
                self.push(ResolutionError::InvalidValue {
                    path: path.to_string(),
                    reason: "expected a string".to_string(),
                });
                None
            }
        }
    }

    /// A string that must not be blank, such as a name.
    fn text(&mut self, value: &Value, path: &str) -> Option<String> {
        let text = self.string(value, path)?;
        if text.trim().is_empty() {
            self.push(ResolutionError::InvalidValue {
                path: path.to_string(),
                reason: "must not be empty".to_string(),
            });
            return None;
        }
        Some(text)
    }

    pub fn strings(&mut self, value: &Value, path: &str) -> Option<Vec<String>> {
        let items = self.sequence(value, path)?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(s) = self.string(item, &format!("{}[{}]", path, index)) {
                out.push(s);
            }
        }
        Some(out)
    }

    fn positive(&mut self, value: &Value, path: &str) -> Option<u32> {
        if value.is_null() {
            return None;
        }
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) if n > 0 => Some(n),
            _ => {
                self.push(ResolutionError::InvalidValue {
                    path: path.to_string(),
                    reason: "expected a positive integer".to_string(),
                });
                None
            }
        }
    }

    /// String-keyed entries of a mapping; other keys are reported.
    pub fn entries<'v>(&mut self, map: &'v Mapping, path: &str) -> Vec<(&'v str, &'v Value)> {
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            match key.as_str() {
                Some(key) => entries.push((key, value)),
                None => self.push(ResolutionError::InvalidValue {
                    path: path.to_string(),
                    reason: format!("mapping key {:?} is not a string", key),
                }),
            }
        }
        entries
    }

    pub fn unknown(&mut self, path: &str, key: &str) {
        self.push(ResolutionError::UnknownKey {
            path: path.to_string(),
            key: key.to_string(),
        });
    }

    fn invalid_task(&mut self, vm: &str, task: &str, reason: &str) {
        self.push(ResolutionError::InvalidTaskSpec {
            vm: vm.to_string(),
            task: task.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Path of `key` below `path`.
pub(crate) fn child(path: &str, key: &str) -> String {
    if path == ROOT {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
