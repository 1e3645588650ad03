//! Manifest resolution
//!
//! Resolution turns a raw user manifest into an [`ExpandedManifest`]:
//!
//! 1. Read the user document, recording every schema error
//! 2. Check name uniqueness on the user's own declarations
//! 3. Per application and VM, merge `defaults` < `languages.<lang>` < user
//! 4. Expand short-hand task keys into the merged task list
//! 5. Check images, then emit everything or nothing

use std::path::Path;

use crate::defaults::{DefaultManifest, LanguageDefaults};
use crate::error::{ResolutionErrors, Result};
use crate::layer::{merge_tasks, ApplicationLayer, TaskLayer, VmLayer};
use crate::manifest::UserManifest;
use crate::model::{
    Application, ExpandedManifest, Language, Task, VirtualMachine, FALLBACK_KEEPALIVE,
    SHELL_TASK_CLASS,
};
use crate::reader::Reader;
use crate::validation;

/// Name of the task a command override runs
const EXECUTE_TASK: &str = "execute";

/// Resolves user manifests against a default manifest.
///
/// A resolver holds no mutable state; one instance can resolve any number
/// of manifests, from any number of threads.
#[derive(Debug, Clone)]
pub struct Resolver<'d> {
    defaults: &'d DefaultManifest,
    command_override: Option<String>,
}

impl<'d> Resolver<'d> {
    pub fn new(defaults: &'d DefaultManifest) -> Self {
        Self {
            defaults,
            command_override: None,
        }
    }

    /// Replace every VM's workflow with a single `execute` task running
    /// `command`.
    pub fn with_command_override(mut self, command: impl Into<String>) -> Self {
        self.command_override = Some(command.into());
        self
    }

    pub fn defaults(&self) -> &'d DefaultManifest {
        self.defaults
    }

    /// Pick the language for a project.
    ///
    /// An explicit `language:` in the manifest wins. Otherwise the project
    /// root is checked for marker files; an ambiguous result is downgraded
    /// to [`Language::NoDefaults`].
    pub fn select_language(&self, manifest: &UserManifest, root: &Path) -> Language {
        if let Some(language) = manifest.language() {
            return language;
        }
        match self.defaults.detector().detect(root) {
            Ok(language) => language,
            Err(e) => {
                tracing::warn!(error = %e, "Using no language defaults");
                Language::NoDefaults
            }
        }
    }

    /// Resolve a manifest for the given detected language.
    ///
    /// Returns every error found, or the complete expanded manifest.
    ///
    /// # Example
    ///
    /// ```
    /// use ravtest_manifest::{DefaultManifest, Language, Resolver, UserManifest};
    ///
    /// let defaults = DefaultManifest::builtin().unwrap();
    /// let manifest = UserManifest::parse(
    ///     "applications:\n- name: unittest\n  vms:\n  - name: vm1\n    image: ubuntu1204\n",
    /// )
    /// .unwrap();
    /// let expanded = Resolver::new(defaults)
    ///     .resolve(&manifest, &Language::NoDefaults)
    ///     .unwrap();
    ///
    /// let vm = &expanded.applications[0].vms[0];
    /// assert_eq!(vm.task_names(), vec!["deploy", "sysinit", "prepare", "execute"]);
    /// ```
    pub fn resolve(
        &self,
        manifest: &UserManifest,
        detected: &Language,
    ) -> std::result::Result<ExpandedManifest, ResolutionErrors> {
        let shorthand = self.defaults.shorthand_keys();
        let mut reader = Reader::new(&shorthand);
        let layer = reader.manifest(manifest.value());
        let mut errors = reader.finish();
        validation::check_names(&layer, &mut errors);

        let language = self.known_language(layer.language.as_ref().unwrap_or(detected));
        let language_defaults = language.name().and_then(|name| self.defaults.language(name));
        tracing::debug!(%language, "Resolving manifest");

        let mut applications = Vec::with_capacity(layer.applications.len());
        for app in &layer.applications {
            let expanded = self.expand_application(app, language_defaults);
            validation::check_application(&expanded, &mut errors);
            applications.push(expanded);
        }

        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "Manifest rejected");
            return Err(ResolutionErrors::new(errors));
        }
        Ok(ExpandedManifest {
            language,
            applications,
        })
    }

    /// Parse and resolve manifest content for the project at `root`.
    pub fn resolve_str(&self, content: &str, root: &Path) -> Result<ExpandedManifest> {
        let manifest = UserManifest::parse(content)?;
        let language = self.select_language(&manifest, root);
        Ok(self.resolve(&manifest, &language)?)
    }

    /// Read and resolve a manifest file. Its directory is the project root.
    pub fn resolve_file(&self, path: &Path) -> Result<ExpandedManifest> {
        let manifest = UserManifest::from_path(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let language = self.select_language(&manifest, root);
        Ok(self.resolve(&manifest, &language)?)
    }

    fn known_language(&self, language: &Language) -> Language {
        match language.name() {
            Some(name) if self.defaults.language(name).is_none() => {
                tracing::warn!(language = name, "Unknown language, using no language defaults");
                Language::NoDefaults
            }
            _ => language.clone(),
        }
    }

    fn expand_application(
        &self,
        app: &ApplicationLayer,
        language: Option<&LanguageDefaults>,
    ) -> Application {
        let mut merged = self.defaults.application_defaults().clone();
        if let Some(language) = language {
            merged.merge(&language.applications);
        }
        merged.merge(app);

        let vms = app
            .vms
            .iter()
            .flatten()
            .map(|vm| self.expand_vm(vm, language))
            .collect();

        Application {
            name: merged.name.unwrap_or_else(|| app.path.clone()),
            blueprint: merged.blueprint,
            keepalive: merged.keepalive.unwrap_or(FALLBACK_KEEPALIVE),
            vms,
        }
    }

    fn expand_vm(&self, vm: &VmLayer, language: Option<&LanguageDefaults>) -> VirtualMachine {
        let mut merged = self.defaults.vm_defaults().clone();
        if let Some(language) = language {
            merged.merge(&language.vms);
        }
        merged.merge(vm);

        let mut tasks = merged.tasks.take().unwrap_or_default();
        merge_tasks(&mut tasks, &vm.shorthand);
        if let Some(command) = &self.command_override {
            tasks = override_tasks(tasks, command);
        }

        let name = merged.name.unwrap_or_else(|| vm.path.clone());
        tracing::debug!(
            vm = %name,
            tasks = ?tasks.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "Expanded VM workflow"
        );

        VirtualMachine {
            name,
            image: merged.image,
            smp: merged.smp,
            memory: merged.memory,
            services: merged.services.unwrap_or_default(),
            tasks: tasks.into_iter().map(finish_task).collect(),
        }
    }
}

/// Resolve `manifest` with a fresh [`Resolver`].
pub fn resolve(
    defaults: &DefaultManifest,
    manifest: &UserManifest,
    language: &Language,
) -> std::result::Result<ExpandedManifest, ResolutionErrors> {
    Resolver::new(defaults).resolve(manifest, language)
}

/// Keep only the `execute` task, running `command`.
fn override_tasks(tasks: Vec<TaskLayer>, command: &str) -> Vec<TaskLayer> {
    let execute = tasks
        .into_iter()
        .find(|task| task.name == EXECUTE_TASK)
        .unwrap_or_else(|| TaskLayer::named(EXECUTE_TASK));
    vec![TaskLayer {
        commands: Some(vec![command.to_string()]),
        ..execute
    }]
}

fn finish_task(task: TaskLayer) -> Task {
    Task {
        name: task.name,
        class: task.class.unwrap_or_else(|| SHELL_TASK_CLASS.to_string()),
        commands: task.commands.unwrap_or_default(),
        user: task.user,
        quiet: task.quiet.unwrap_or(false),
        options: task.options,
    }
}
