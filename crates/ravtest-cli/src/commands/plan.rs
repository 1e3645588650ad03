//! The `plan` command

use std::sync::Arc;

use colored::Colorize;
use ravtest_manifest::{Application, ExpandedManifest, VirtualMachine};
use ravtest_tasks::{ExecutionContext, Recorded, RecordingRunner, Target, TaskRegistry};

use super::resolve_project;
use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};

/// Print, per VM, what each task of the workflow would run.
pub fn run_plan(
    project: &ProjectArgs,
    application: Option<&str>,
    command: Option<&str>,
) -> Result<()> {
    let expanded = resolve_project(project, command)?;
    let apps = select_applications(&expanded, application)?;
    let registry = TaskRegistry::with_builtins();

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    for app in apps {
        for vm in &app.vms {
            let lines = runtime.block_on(plan_vm(&expanded, app, vm, &registry, project))?;
            println!("{}", format!("{} / {}", app.name, vm.name).bold());
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn select_applications<'a>(
    expanded: &'a ExpandedManifest,
    name: Option<&str>,
) -> Result<Vec<&'a Application>> {
    match name {
        None => Ok(expanded.applications.iter().collect()),
        Some(name) => expanded
            .application(name)
            .map(|app| vec![app])
            .ok_or_else(|| CliError::user(format!("Unknown application '{}'.", name))),
    }
}

/// Dry-run one VM's workflow against a recording runner.
async fn plan_vm(
    expanded: &ExpandedManifest,
    app: &Application,
    vm: &VirtualMachine,
    registry: &TaskRegistry,
    project: &ProjectArgs,
) -> Result<Vec<String>> {
    let runner = Arc::new(RecordingRunner::new());
    let context = ExecutionContext::new(
        app,
        vm,
        expanded.language.clone(),
        Target::new(vm.name.clone()),
        runner.clone(),
    )
    .with_project_root(&project.dir);

    let mut lines = Vec::new();
    for handler in registry.build_vm(vm)? {
        lines.push(format!("  {} [{}]", handler.name().cyan(), handler.class()));
        let seen = runner.calls().len();
        handler.execute(&context).await?;
        for call in &runner.calls()[seen..] {
            lines.push(describe(call));
        }
    }
    Ok(lines)
}

fn describe(call: &Recorded) -> String {
    match call {
        Recorded::Run(request) => match &request.user {
            Some(user) => format!("    $ {}  (as {})", request.command, user),
            None => format!("    $ {}", request.command),
        },
        Recorded::Upload { local, remote } => {
            format!("    upload {} -> {}", local.display(), remote)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ravtest_manifest::{DefaultManifest, Language, Resolver, UserManifest};
    use ravtest_tasks::CommandRequest;
    use ravtest_test_utils::manifests;
    use std::path::PathBuf;

    fn expand(yaml: &str) -> ExpandedManifest {
        let manifest = UserManifest::parse(yaml).unwrap();
        Resolver::new(DefaultManifest::builtin().unwrap())
            .resolve(&manifest, &Language::NoDefaults)
            .unwrap()
    }

    #[test]
    fn test_unknown_application() {
        let expanded = expand(manifests::MINIMAL);
        let err = select_applications(&expanded, Some("nightly")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown application 'nightly'.");
        assert_eq!(select_applications(&expanded, None).unwrap().len(), 1);
    }

    #[test]
    fn test_describe_calls() {
        let run = Recorded::Run(CommandRequest::new("apt-get update").with_user(Some("root".into())));
        assert_eq!(describe(&run), "    $ apt-get update  (as root)");
        let upload = Recorded::Upload {
            local: PathBuf::from("."),
            remote: "ravtest".into(),
        };
        assert_eq!(describe(&upload), "    upload . -> ravtest");
    }

    #[tokio::test]
    async fn test_plan_vm_lists_sysinit_commands() {
        colored::control::set_override(false);
        let expanded = expand(manifests::SHORTHAND);
        let app = &expanded.applications[0];
        let project = ProjectArgs {
            dir: PathBuf::from("."),
            manifest: None,
        };

        let lines = plan_vm(&expanded, app, &app.vms[0], &TaskRegistry::with_builtins(), &project)
            .await
            .unwrap();
        assert!(lines.contains(&"    $ apt-get update  (as root)".to_string()));
        assert!(lines.contains(&"    $ nosetests".to_string()));
        assert_eq!(lines[0], "  deploy [ravtest.tasks.DeployTask]");
    }
}
