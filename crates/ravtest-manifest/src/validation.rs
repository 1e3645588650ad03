//! Semantic checks on manifests
//!
//! Schema errors are found while reading. The checks here need a complete
//! view: name uniqueness runs over the user's layer, before merging can fold
//! duplicates together, and image checks run over the expanded tree.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::{NameScope, ResolutionError};
use crate::layer::{ApplicationLayer, ManifestLayer, VmLayer};
use crate::model::Application;
use crate::reader::child;

/// Check required names and their uniqueness in the user's manifest.
pub(crate) fn check_names(manifest: &ManifestLayer, errors: &mut Vec<ResolutionError>) {
    let mut apps: HashMap<&str, &str> = HashMap::new();
    for app in &manifest.applications {
        if let Some(name) = require_name(app.name.as_deref(), &app.path, errors) {
            if let Some(first) = first_seen(&mut apps, name, &app.path) {
                errors.push(ResolutionError::DuplicateName {
                    scope: NameScope::Application,
                    name: name.to_string(),
                    first: first.to_string(),
                    second: app.path.clone(),
                });
            }
        }
        check_vms(app, errors);
    }
}

fn check_vms(app: &ApplicationLayer, errors: &mut Vec<ResolutionError>) {
    let application = app.name.clone().unwrap_or_else(|| app.path.clone());
    let vms: &[VmLayer] = app.vms.as_deref().unwrap_or_default();
    if vms.is_empty() {
        if !reported(errors, &child(&app.path, "vms")) {
            errors.push(ResolutionError::EmptyVms {
                application: application.clone(),
            });
        }
        return;
    }

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for vm in vms {
        let Some(name) = require_name(vm.name.as_deref(), &vm.path, errors) else {
            continue;
        };
        if let Some(first) = first_seen(&mut seen, name, &vm.path) {
            errors.push(ResolutionError::DuplicateName {
                scope: NameScope::VirtualMachine {
                    application: application.clone(),
                },
                name: name.to_string(),
                first: first.to_string(),
                second: vm.path.clone(),
            });
        }

        let mut tasks: HashMap<&str, &str> = HashMap::new();
        for task in vm.tasks.iter().flatten() {
            if let Some(first) = first_seen(&mut tasks, &task.name, &task.path) {
                errors.push(ResolutionError::DuplicateName {
                    scope: NameScope::Task {
                        vm: name.to_string(),
                    },
                    name: task.name.clone(),
                    first: first.to_string(),
                    second: task.path.clone(),
                });
            }
        }
    }
}

/// Check that every VM of a from-scratch application has an image.
pub(crate) fn check_application(app: &Application, errors: &mut Vec<ResolutionError>) {
    if app.blueprint.is_some() {
        return;
    }
    for vm in app.vms.iter().filter(|vm| vm.image.is_none()) {
        errors.push(ResolutionError::MissingImage {
            application: app.name.clone(),
            vm: vm.name.clone(),
        });
    }
}

/// The name, or a `MissingField` error unless the reader already reported
/// a bad value for it.
fn require_name<'a>(
    name: Option<&'a str>,
    path: &str,
    errors: &mut Vec<ResolutionError>,
) -> Option<&'a str> {
    if name.is_none() && !reported(errors, &child(path, "name")) {
        errors.push(ResolutionError::MissingField {
            path: path.to_string(),
            field: "name".to_string(),
        });
    }
    name
}

/// The path `name` was first declared at, or `None` after recording this
/// declaration as the first.
pub(crate) fn first_seen<'a>(
    seen: &mut HashMap<&'a str, &'a str>,
    name: &'a str,
    path: &'a str,
) -> Option<&'a str> {
    match seen.entry(name) {
        Entry::Occupied(first) => Some(*first.get()),
        Entry::Vacant(slot) => {
            slot.insert(path);
            None
        }
    }
}

/// Whether the reader already rejected the value at `field`.
fn reported(errors: &[ResolutionError], field: &str) -> bool {
    errors
        .iter()
        .any(|e| matches!(e, ResolutionError::InvalidValue { path, .. } if path == field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::TaskLayer;
    use pretty_assertions::assert_eq;

    fn vm(name: &str, path: &str) -> VmLayer {
        VmLayer {
            name: Some(name.to_string()),
            path: path.to_string(),
            ..VmLayer::default()
        }
    }

    fn app(name: Option<&str>, path: &str, vms: Option<Vec<VmLayer>>) -> ApplicationLayer {
        ApplicationLayer {
            name: name.map(String::from),
            vms,
            path: path.to_string(),
            ..ApplicationLayer::default()
        }
    }

    #[test]
    fn third_duplicate_references_first() {
        let vms = Some(vec![vm("v", "applications[0].vms[0]")]);
        let manifest = ManifestLayer {
            language: None,
            applications: vec![
                app(Some("a"), "applications[0]", vms.clone()),
                app(Some("a"), "applications[1]", vms.clone()),
                app(Some("a"), "applications[2]", vms),
            ],
        };
        let mut errors = Vec::new();
        check_names(&manifest, &mut errors);

        let pairs: Vec<_> = errors
            .iter()
            .map(|e| match e {
                ResolutionError::DuplicateName { first, second, .. } => {
                    (first.as_str(), second.as_str())
                }
                other => panic!("unexpected error {other}"),
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("applications[0]", "applications[1]"),
                ("applications[0]", "applications[2]"),
            ]
        );
    }

    #[test]
    fn bad_values_are_not_reported_twice() {
        let mut errors = vec![
            ResolutionError::InvalidValue {
                path: "applications[0].name".into(),
                reason: "expected a string".into(),
            },
            ResolutionError::InvalidValue {
                path: "applications[0].vms".into(),
                reason: "expected a list".into(),
            },
        ];
        let manifest = ManifestLayer {
            language: None,
            applications: vec![app(None, "applications[0]", None)],
        };
        check_names(&manifest, &mut errors);
        assert_eq!(errors.len(), 2, "{:#?}", errors);
    }

    #[test]
    fn duplicate_user_tasks_are_scoped_to_vm() {
        let mut web = vm("web", "applications[0].vms[0]");
        web.tasks = Some(vec![
            TaskLayer {
                path: "applications[0].vms[0].tasks[0]".into(),
                ..TaskLayer::named("lint")
            },
            TaskLayer {
                path: "applications[0].vms[0].tasks[1]".into(),
                ..TaskLayer::named("lint")
            },
        ]);
        let manifest = ManifestLayer {
            language: None,
            applications: vec![app(Some("a"), "applications[0]", Some(vec![web]))],
        };
        let mut errors = Vec::new();
        check_names(&manifest, &mut errors);
        assert!(matches!(
            &errors[..],
            [ResolutionError::DuplicateName { scope: NameScope::Task { vm }, .. }] if vm == "web"
        ));
    }
}
