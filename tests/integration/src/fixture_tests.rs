//! End-to-end tests over the sample projects in `test-fixtures/projects`
//!
//! Each fixture goes through the complete flow: language detection ->
//! resolution -> handler construction -> dry run of every VM workflow.

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use ravtest_manifest::{
    DefaultManifest, Error, ExpandedManifest, Language, MANIFEST_FILENAME, ResolutionError,
    Resolver,
};
use ravtest_tasks::{ExecutionContext, RecordingRunner, Target, TaskRegistry, run_tasks};
use rstest::rstest;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/projects")
        .join(name)
}

fn resolve_fixture(name: &str) -> ExpandedManifest {
    Resolver::new(DefaultManifest::builtin().unwrap())
        .resolve_file(&fixture(name).join(MANIFEST_FILENAME))
        .unwrap()
}

/// Dry-run every VM and return the commands each one ran.
async fn dry_run(expanded: &ExpandedManifest, root: PathBuf) -> Vec<(String, Vec<String>)> {
    let registry = TaskRegistry::with_builtins();
    let mut runs = Vec::new();
    for app in &expanded.applications {
        for vm in &app.vms {
            let runner = Arc::new(RecordingRunner::new());
            let context = ExecutionContext::new(
                app,
                vm,
                expanded.language.clone(),
                Target::new(vm.name.clone()),
                runner.clone(),
            )
            .with_project_root(root.clone());
            let handlers = registry.build_vm(vm).unwrap();
            run_tasks(&handlers, &context).await.unwrap();
            runs.push((vm.name.clone(), runner.commands()));
        }
    }
    runs
}

#[rstest]
#[case("python-nose", Language::named("python"))]
#[case("maven-multi-vm", Language::named("maven"))]
#[case("blueprint-smoke", Language::NoDefaults)]
fn fixture_language(#[case] name: &str, #[case] expected: Language) {
    assert_eq!(resolve_fixture(name).language, expected);
}

#[tokio::test]
async fn python_fixture_runs_per_vm_overrides() {
    let expanded = resolve_fixture("python-nose");
    let runs = dry_run(&expanded, fixture("python-nose")).await;

    assert_eq!(runs.len(), 2);
    let (ubuntu, ubuntu_commands) = &runs[0];
    assert_eq!(ubuntu, "ubuntu");
    assert!(ubuntu_commands.contains(&"apt-get -y install python-nose".to_string()));
    assert_eq!(ubuntu_commands.last().unwrap(), "python setup.py test");

    let fedora = expanded.applications[0].vm("fedora").unwrap();
    let execute = fedora.task("execute").unwrap();
    assert_eq!(execute.commands, vec!["nosetests -v"]);
    assert_eq!(execute.user.as_deref(), Some("tester"));
    assert_eq!(runs[1].1.last().unwrap(), "nosetests -v");
}

#[tokio::test]
async fn maven_fixture_appends_custom_task() {
    let expanded = resolve_fixture("maven-multi-vm");
    let app = expanded.application("integration").unwrap();
    assert_eq!(app.keepalive, 120);

    let vm = app.vm("app").unwrap();
    assert_eq!(
        vm.task_names(),
        vec!["deploy", "sysinit", "prepare", "execute", "smoke"]
    );
    assert_eq!(
        vm.task("prepare").unwrap().commands,
        vec!["mvn -q -Pintegration install -DskipTests=true"]
    );
    assert_eq!(vm.task("execute").unwrap().commands, vec!["mvn -q test"]);
    let ports: Vec<_> = vm.services.iter().map(|s| s.port).collect();
    assert_eq!(ports, vec![8080, 22]);

    let runs = dry_run(&expanded, fixture("maven-multi-vm")).await;
    assert_eq!(runs[1].1.last().unwrap(), "pg_isready");
}

#[tokio::test]
async fn blueprint_fixture_needs_no_images() {
    let expanded = resolve_fixture("blueprint-smoke");
    let app = &expanded.applications[0];
    assert_eq!(app.blueprint.as_deref(), Some("smoke-bp"));
    assert!(app.vms.iter().all(|vm| vm.image.is_none()));
    assert_eq!(app.vm("backend").unwrap().task_names().len(), 4);

    let runs = dry_run(&expanded, fixture("blueprint-smoke")).await;
    assert_eq!(runs[0].1.last().unwrap(), "./smoke.sh frontend");
}

#[test]
fn broken_fixture_reports_all_errors() {
    let err = Resolver::new(DefaultManifest::builtin().unwrap())
        .resolve_file(&fixture("broken").join(MANIFEST_FILENAME))
        .unwrap_err();
    let errors = match err {
        Error::Resolution(errors) => errors.into_inner(),
        other => panic!("expected resolution errors, got {other}"),
    };

    assert_eq!(errors.len(), 5, "{:#?}", errors);
    assert!(errors.iter().any(|e| matches!(e, ResolutionError::MissingImage { .. })));
    assert!(errors.iter().any(|e| matches!(e, ResolutionError::InvalidTaskSpec { task, .. } if task == "lint")));
    assert!(errors.iter().any(|e| matches!(e, ResolutionError::DuplicateName { .. })));
    assert!(errors.iter().any(|e| matches!(e, ResolutionError::EmptyVms { .. })));
    assert!(errors.iter().any(|e| matches!(e, ResolutionError::InvalidValue { path, .. } if path == "applications[1].keepalive")));
}
