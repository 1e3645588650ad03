//! The default manifest
//!
//! The default manifest is the lowest layer of every resolution. It is
//! trusted, read once per process, and never modified afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use serde_yaml::Value;

use crate::detect::LanguageDetector;
use crate::error::{Error, NameScope, ResolutionError, ResolutionErrors, Result};
use crate::layer::{ApplicationLayer, TaskLayer, VmLayer};
use crate::model::NODEFAULTS;
use crate::reader::{Origin, ROOT, Reader, child};
use crate::validation::first_seen;

/// Source of the built-in defaults
pub const BUILTIN_DEFAULTS: &str = include_str!("defaults.yml");

/// Defaults that apply when a project is of one language.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageDefaults {
    pub name: String,

    /// File name globs that identify a project of this language
    pub detect: Vec<String>,

    pub applications: ApplicationLayer,
    pub vms: VmLayer,
}

/// The parsed default manifest.
#[derive(Debug, Clone)]
pub struct DefaultManifest {
    applications: ApplicationLayer,
    vms: VmLayer,
    languages: BTreeMap<String, LanguageDefaults>,
    detector: LanguageDetector,
}

impl DefaultManifest {
    /// The defaults shipped with ravtest, parsed on first use.
    pub fn builtin() -> Result<&'static DefaultManifest> {
        static BUILTIN: OnceLock<std::result::Result<DefaultManifest, String>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| Self::parse(BUILTIN_DEFAULTS).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|message| Error::InvalidDefaults {
                message: message.clone(),
            })
    }

    /// Parse a default manifest from YAML.
    ///
    /// The document has two top-level keys: `defaults` (with `applications`
    /// and `vms` sections) and `languages` (one section per language).
    pub fn parse(content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)?;
        let no_shorthand = BTreeSet::new();
        let mut reader = Reader::new(&no_shorthand);

        let mut applications = ApplicationLayer::default();
        let mut vms = VmLayer::default();
        let mut languages = BTreeMap::new();

        if let Some(map) = reader.mapping(&root, ROOT) {
            for (key, value) in reader.entries(map, ROOT) {
                match key {
                    "defaults" => {
                        (applications, vms) = read_sections(&mut reader, value, "defaults");
                    }
                    "languages" => languages = read_languages(&mut reader, value),
                    other => reader.unknown(ROOT, other),
                }
            }
        }

        check_task_names(&vms, &mut reader);
        for language in languages.values() {
            check_task_names(&language.vms, &mut reader);
        }

        let errors = reader.finish();
        if !errors.is_empty() {
            return Err(Error::InvalidDefaults {
                message: ResolutionErrors::new(errors).to_string(),
            });
        }

        let detector = LanguageDetector::new(languages.values())?;
        let manifest = DefaultManifest {
            applications,
            vms,
            languages,
            detector,
        };

        tracing::debug!(
            pipeline = ?manifest.pipeline(),
            languages = ?manifest.languages.keys().collect::<Vec<_>>(),
            "Loaded default manifest"
        );
        Ok(manifest)
    }

    /// Names of the default tasks, in pipeline order
    pub fn pipeline(&self) -> Vec<&str> {
        self.vms
            .tasks
            .iter()
            .flatten()
            .map(|task| task.name.as_str())
            .collect()
    }

    /// VM keys that expand into a task of the same name
    pub fn shorthand_keys(&self) -> BTreeSet<String> {
        self.pipeline().into_iter().map(String::from).collect()
    }

    /// Application-level defaults
    pub fn application_defaults(&self) -> &ApplicationLayer {
        &self.applications
    }

    /// VM-level defaults, including the default pipeline
    pub fn vm_defaults(&self) -> &VmLayer {
        &self.vms
    }

    /// Defaults for one language
    pub fn language(&self, name: &str) -> Option<&LanguageDefaults> {
        self.languages.get(name)
    }

    /// All languages, sorted by name
    pub fn languages(&self) -> impl Iterator<Item = &LanguageDefaults> {
        self.languages.values()
    }

    /// Detector built from the languages' `detect` globs
    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }
}

fn read_sections(reader: &mut Reader<'_>, value: &Value, path: &str) -> (ApplicationLayer, VmLayer) {
    let mut applications = ApplicationLayer::default();
    let mut vms = VmLayer::default();
    let Some(map) = reader.mapping(value, path) else {
        return (applications, vms);
    };
    for (key, value) in reader.entries(map, path) {
        let field = child(path, key);
        match key {
            "applications" => {
                if let Some(layer) = reader.application(value, field, Origin::Defaults) {
                    applications = layer;
                }
            }
            "vms" => {
                if let Some(layer) = reader.vm(value, field, Origin::Defaults) {
                    vms = layer;
                }
            }
            "detect" if path.starts_with("languages.") => {}
            other => reader.unknown(path, other),
        }
    }
    (applications, vms)
}

fn read_languages(reader: &mut Reader<'_>, value: &Value) -> BTreeMap<String, LanguageDefaults> {
    let mut languages = BTreeMap::new();
    let Some(map) = reader.mapping(value, "languages") else {
        return languages;
    };
    for (name, section) in reader.entries(map, "languages") {
        let path = child("languages", name);
        if name.eq_ignore_ascii_case(NODEFAULTS) {
            reader.push(ResolutionError::InvalidValue {
                path,
                reason: format!("'{}' is reserved and cannot be defined", NODEFAULTS),
            });
            continue;
        }
        let detect = section
            .as_mapping()
            .and_then(|m| m.get("detect"))
            .and_then(|d| reader.strings(d, &child(&path, "detect")))
            .unwrap_or_default();
        let (applications, vms) = read_sections(reader, section, &path);
        let name = name.to_lowercase();
        languages.insert(
            name.clone(),
            LanguageDefaults {
                name,
                detect,
                applications,
                vms,
            },
        );
    }
    languages
}

fn check_task_names(vm: &VmLayer, reader: &mut Reader<'_>) {
    let tasks: &[TaskLayer] = vm.tasks.as_deref().unwrap_or_default();
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for task in tasks {
        if let Some(first) = first_seen(&mut seen, &task.name, &task.path) {
            reader.push(ResolutionError::DuplicateName {
                scope: NameScope::Task {
                    vm: "defaults".to_string(),
                },
                name: task.name.clone(),
                first: first.to_string(),
                second: task.path.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_defaults_parse() {
        let defaults = DefaultManifest::builtin().unwrap();
        assert_eq!(
            defaults.pipeline(),
            vec!["deploy", "sysinit", "prepare", "execute"]
        );
        assert_eq!(defaults.application_defaults().keepalive, Some(50));
    }

    #[test]
    fn builtin_languages_have_markers() {
        let defaults = DefaultManifest::builtin().unwrap();
        let markers: Vec<_> = defaults
            .languages()
            .map(|l| (l.name.as_str(), l.detect.join(",")))
            .collect();
        assert_eq!(
            markers,
            vec![
                ("ant", "build.xml".to_string()),
                ("clojure", "project.clj".to_string()),
                ("maven", "pom.xml".to_string()),
                ("python", "setup.py".to_string()),
            ]
        );
    }

    #[test]
    fn nodefaults_cannot_be_defined() {
        let err = DefaultManifest::parse("languages:\n  nodefaults:\n    detect: [x]\n").unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn duplicate_default_tasks_are_rejected() {
        let err = DefaultManifest::parse(
            "defaults:\n  vms:\n    tasks:\n    - name: a\n    - name: a\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDefaults { .. }));
        assert!(err.to_string().contains("duplicate task"));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let err = DefaultManifest::parse("defaults:\n  hosts: {}\n").unwrap_err();
        assert!(err.to_string().contains("unknown key 'hosts'"));
    }
}
