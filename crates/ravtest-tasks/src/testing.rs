use std::sync::Arc;

use ravtest_manifest::{Application, Language, Task, VirtualMachine, SHELL_TASK_CLASS};

use crate::context::{ExecutionContext, Target};
use crate::runner::CommandRunner;

pub(crate) fn task(name: &str, class: &str, commands: &[&str]) -> Task {
    Task {
        name: name.to_string(),
        class: class.to_string(),
        commands: commands.iter().map(|c| c.to_string()).collect(),
        user: None,
        quiet: false,
        options: Default::default(),
    }
}

pub(crate) fn shell(name: &str, commands: &[&str]) -> Task {
    task(name, SHELL_TASK_CLASS, commands)
}

pub(crate) fn vm(tasks: Vec<Task>) -> VirtualMachine {
    VirtualMachine {
        name: "vm1".to_string(),
        image: Some("ubuntu1204".to_string()),
        smp: None,
        memory: None,
        services: vec![],
        tasks,
    }
}

pub(crate) fn context(runner: Arc<dyn CommandRunner>) -> ExecutionContext {
    let vm = vm(vec![]);
    let app = Application {
        name: "unittest".to_string(),
        blueprint: None,
        keepalive: 50,
        vms: vec![vm.clone()],
    };
    ExecutionContext::new(&app, &vm, Language::NoDefaults, Target::new("10.0.0.5"), runner)
}
