//! Project deployment

use async_trait::async_trait;
use ravtest_manifest::Task;

use super::shell::ShellTask;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::handler::{TaskHandler, TaskOutcome};
use crate::runner::CommandRequest;

pub const DEPLOY_TASK_CLASS: &str = "ravtest.tasks.DeployTask";

/// Copies the local project into the remote work directory, then runs its
/// commands there.
#[derive(Debug, Clone)]
pub struct DeployTask {
    shell: ShellTask,
}

impl DeployTask {
    pub fn from_task(task: &Task) -> Self {
        Self {
            shell: ShellTask::from_task(task),
        }
    }
}

#[async_trait]
impl TaskHandler for DeployTask {
    fn name(&self) -> &str {
        self.shell.name()
    }

    fn class(&self) -> &str {
        DEPLOY_TASK_CLASS
    }

    async fn execute(&self, context: &ExecutionContext) -> Result<TaskOutcome> {
        let mkdir = CommandRequest::new(format!("mkdir -p {}", context.workdir)).quiet(true);
        self.shell.check(context, &mkdir).await?;

        tracing::debug!(
            vm = %context.vm,
            local = %context.project_root.display(),
            remote = %context.workdir,
            "Uploading project"
        );
        context
            .runner()
            .upload(&context.target, &context.project_root, &context.workdir)
            .await?;

        let count = self.shell.run_commands(context).await?;
        Ok(TaskOutcome::completed(self.name(), count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{Recorded, RecordingRunner};
    use crate::testing::{context, task};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[tokio::test]
    async fn uploads_before_running_commands() {
        let runner = Arc::new(RecordingRunner::new());
        let ctx = context(runner.clone()).with_project_root("/src/project");
        let handler = DeployTask::from_task(&task("deploy", DEPLOY_TASK_CLASS, &["ls"]));

        let outcome = handler.execute(&ctx).await.unwrap();
        assert_eq!(outcome, TaskOutcome::completed("deploy", 1));

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(&calls[0], Recorded::Run(r) if r.command == "mkdir -p ravtest"));
        assert_eq!(
            calls[1],
            Recorded::Upload {
                local: PathBuf::from("/src/project"),
                remote: "ravtest".to_string(),
            }
        );
        assert!(matches!(&calls[2], Recorded::Run(r) if r.command == "ls"));
    }
}
