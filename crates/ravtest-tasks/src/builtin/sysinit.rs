//! One-time VM initialisation

use async_trait::async_trait;
use ravtest_manifest::Task;

use super::shell::ShellTask;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::handler::{TaskHandler, TaskOutcome};
use crate::runner::CommandRequest;

pub const SYSINIT_TASK_CLASS: &str = "ravtest.tasks.SysinitTask";

/// Suffix of the marker files that record a completed initialisation
const MARKER_SUFFIX: &str = ".done";

/// Marker file recording that `task` completed on a VM.
fn marker_path(task: &str) -> String {
    format!("~/{}{}", task, MARKER_SUFFIX)
}

/// Whether `path` names a sysinit marker file.
pub(crate) fn is_marker(path: &str) -> bool {
    path.strip_prefix("~/")
        .and_then(|file| file.strip_suffix(MARKER_SUFFIX))
        .is_some_and(|task| !task.is_empty() && !task.contains('/'))
}

/// Runs its commands only on the first run against a VM.
///
/// A marker file `~/<task>.done` in the login's home records that the
/// commands have completed. A VM that is reused keeps its marker.
#[derive(Debug, Clone)]
pub struct SysinitTask {
    shell: ShellTask,
}

impl SysinitTask {
    pub fn from_task(task: &Task) -> Self {
        Self {
            shell: ShellTask::from_task(task),
        }
    }

    fn marker(&self) -> String {
        marker_path(self.shell.name())
    }
}

#[async_trait]
impl TaskHandler for SysinitTask {
    fn name(&self) -> &str {
        self.shell.name()
    }

    fn class(&self) -> &str {
        SYSINIT_TASK_CLASS
    }

    async fn execute(&self, context: &ExecutionContext) -> Result<TaskOutcome> {
        let probe = CommandRequest::new(format!("test -f {}", self.marker())).quiet(true);
        let output = context.runner().run(&context.target, &probe).await?;
        if output.success() {
            tracing::debug!(vm = %context.vm, task = self.name(), "Already initialised");
            return Ok(TaskOutcome::skipped(self.name()));
        }

        let count = self.shell.run_commands(context).await?;
        let touch = CommandRequest::new(format!("touch {}", self.marker())).quiet(true);
        self.shell.check(context, &touch).await?;
        Ok(TaskOutcome::completed(self.name(), count))
    }
}
