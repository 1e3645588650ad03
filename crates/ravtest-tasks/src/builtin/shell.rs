//! The generic shell-command task

use async_trait::async_trait;
use ravtest_manifest::{SHELL_TASK_CLASS, Task};

use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::handler::{TaskHandler, TaskOutcome};
use crate::runner::CommandRequest;

/// Runs the task's commands in order, in the work directory.
#[derive(Debug, Clone)]
pub struct ShellTask {
    name: String,
    class: String,
    commands: Vec<String>,
    user: Option<String>,
    quiet: bool,
}

impl ShellTask {
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            class: task.class.clone(),
            commands: task.commands.clone(),
            user: task.user.clone(),
            quiet: task.quiet,
        }
    }

    /// Run every command, failing on the first non-zero exit.
    pub(crate) async fn run_commands(&self, context: &ExecutionContext) -> Result<usize> {
        for command in &self.commands {
            let request = CommandRequest::new(context.expand(command))
                .with_user(self.user.clone())
                .with_workdir(context.workdir.clone())
                .quiet(self.quiet);
            self.check(context, &request).await?;
        }
        Ok(self.commands.len())
    }

    /// Run one request as part of this task, failing on a non-zero exit.
    pub(crate) async fn check(
        &self,
        context: &ExecutionContext,
        request: &CommandRequest,
    ) -> Result<()> {
        let output = context.runner().run(&context.target, request).await?;
        if !output.success() {
            if !output.stderr.is_empty() {
                tracing::debug!(task = %self.name, stderr = %output.stderr, "Command output");
            }
            return Err(Error::TaskFailed {
                task: self.name.clone(),
                command: request.command.clone(),
                status: output.status,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for ShellTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> &str {
        if self.class.is_empty() {
            SHELL_TASK_CLASS
        } else {
            &self.class
        }
    }

    async fn execute(&self, context: &ExecutionContext) -> Result<TaskOutcome> {
        let count = self.run_commands(context).await?;
        Ok(TaskOutcome::completed(&self.name, count))
    }
}
