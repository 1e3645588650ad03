//! Running resolved workflows through the built-in handlers.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use ravtest_manifest::{DefaultManifest, ExpandedManifest, Language, Resolver, UserManifest};
use ravtest_tasks::{
    Error, ExecutionContext, LocalRunner, Recorded, RecordingRunner, Target, TaskRegistry,
    TaskStatus, run_tasks,
};

const MANIFEST: &str = r#"
applications:
- name: unittest
  vms:
  - name: vm1
    image: ubuntu1204
    sysinit: ["echo init >> ~/init.log"]
    execute: ["test -f setup.py", "echo {application}-{vm} > result.txt"]
"#;

fn expand(yaml: &str, language: Language) -> ExpandedManifest {
    let manifest = UserManifest::parse(yaml).unwrap();
    Resolver::new(DefaultManifest::builtin().unwrap())
        .resolve(&manifest, &language)
        .unwrap()
}

#[tokio::test]
async fn python_workflow_runs_in_pipeline_order() {
    let expanded = expand(MANIFEST, Language::named("python"));
    let app = &expanded.applications[0];
    let vm = &app.vms[0];

    let runner = Arc::new(RecordingRunner::new());
    let context = ExecutionContext::new(
        app,
        vm,
        expanded.language.clone(),
        Target::new("10.0.0.5"),
        runner.clone(),
    );
    let handlers = TaskRegistry::with_builtins().build_vm(vm).unwrap();
    let outcomes = run_tasks(&handlers, &context).await.unwrap();

    let names: Vec<_> = outcomes.iter().map(|o| o.task.as_str()).collect();
    assert_eq!(names, vec!["deploy", "sysinit", "prepare", "execute"]);
    assert!(outcomes.iter().all(|o| o.status == TaskStatus::Completed));

    assert_eq!(
        runner.commands(),
        vec![
            "mkdir -p ravtest",
            "test -f ~/sysinit.done",
            "echo init >> ~/init.log",
            "touch ~/sysinit.done",
            "python setup.py build",
            "test -f setup.py",
            "echo unittest-vm1 > result.txt",
        ]
    );

    let sysinit_user = runner.calls().into_iter().find_map(|call| match call {
        Recorded::Run(request) if request.command.starts_with("echo init") => request.user,
        _ => None,
    });
    assert_eq!(sysinit_user.as_deref(), Some("root"));
}

#[rstest]
#[case::clojure("clojure", "lein deps", "lein test")]
#[case::maven("maven", "mvn -q install -DskipTests=true", "mvn -q test")]
#[case::ant("ant", "ant -q compile", "ant -q test")]
#[tokio::test]
async fn language_defaults_drive_the_workflow(
    #[case] language: &str,
    #[case] prepare: &str,
    #[case] execute: &str,
) {
    let expanded = expand(
        "applications:\n- name: unittest\n  vms:\n  - name: vm1\n    image: ubuntu1204\n",
        Language::named(language),
    );
    let app = &expanded.applications[0];
    let vm = &app.vms[0];

    let runner = Arc::new(RecordingRunner::new());
    let context = ExecutionContext::new(
        app,
        vm,
        expanded.language.clone(),
        Target::new("10.0.0.5"),
        runner.clone(),
    );
    let handlers = TaskRegistry::with_builtins().build_vm(vm).unwrap();
    run_tasks(&handlers, &context).await.unwrap();

    let commands = runner.commands();
    assert_eq!(&commands[commands.len() - 2..], &[prepare.to_string(), execute.to_string()]);
}

#[tokio::test]
async fn failure_stops_the_workflow() {
    let expanded = expand(MANIFEST, Language::NoDefaults);
    let app = &expanded.applications[0];
    let vm = &app.vms[0];

    let runner = Arc::new(RecordingRunner::new().fail_on("test -f setup.py", 1));
    let context = ExecutionContext::new(
        app,
        vm,
        Language::NoDefaults,
        Target::new("10.0.0.5"),
        runner.clone(),
    );
    let handlers = TaskRegistry::with_builtins().build_vm(vm).unwrap();
    let err = run_tasks(&handlers, &context).await.unwrap_err();

    assert!(matches!(err, Error::TaskFailed { ref task, status: 1, .. } if task == "execute"));
    assert_eq!(runner.commands().last().map(String::as_str), Some("test -f setup.py"));
}

#[test]
fn custom_classes_need_registration() {
    let expanded = expand(
        r#"
applications:
- name: unittest
  vms:
  - name: vm1
    image: ubuntu1204
    tasks:
    - name: report
      class: acme.tasks.Report
"#,
        Language::NoDefaults,
    );
    let registry = TaskRegistry::with_builtins();

    let errors = registry.check(&expanded);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("acme.tasks.Report"));
    assert!(registry.build_vm(&expanded.applications[0].vms[0]).is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn local_runner_executes_whole_workflow() {
    let project = tempfile::TempDir::new().unwrap();
    std::fs::write(project.path().join("setup.py"), "").unwrap();
    let home = tempfile::TempDir::new().unwrap();

    let expanded = expand(MANIFEST, Language::NoDefaults);
    let app = &expanded.applications[0];
    let vm = &app.vms[0];
    let context = ExecutionContext::new(
        app,
        vm,
        Language::NoDefaults,
        Target::new("localhost"),
        Arc::new(LocalRunner::new(home.path())),
    )
    .with_project_root(project.path());
    let handlers = TaskRegistry::with_builtins().build_vm(vm).unwrap();

    let first = run_tasks(&handlers, &context).await.unwrap();
    let second = run_tasks(&handlers, &context).await.unwrap();

    let result = std::fs::read_to_string(home.path().join("ravtest/result.txt")).unwrap();
    assert_eq!(result, "unittest-vm1\n");
    assert_eq!(first[1].status, TaskStatus::Completed);
    assert_eq!(second[1].status, TaskStatus::Skipped);
    let log = std::fs::read_to_string(home.path().join("init.log")).unwrap();
    assert_eq!(log, "init\n");
}
