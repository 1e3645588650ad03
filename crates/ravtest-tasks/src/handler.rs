//! TaskHandler trait and the sequential workflow runner

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::Result;

/// How a task finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    /// The task decided there was nothing to do
    Skipped,
}

/// Report from running one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task: String,
    pub status: TaskStatus,
    pub commands_run: usize,
}

impl TaskOutcome {
    pub fn completed(task: impl Into<String>, commands_run: usize) -> Self {
        Self {
            task: task.into(),
            status: TaskStatus::Completed,
            commands_run,
        }
    }

    pub fn skipped(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            status: TaskStatus::Skipped,
            commands_run: 0,
        }
    }
}

/// One runnable step of a VM workflow.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Task name from the manifest
    fn name(&self) -> &str;

    /// Class identifier the handler was built for
    fn class(&self) -> &str;

    async fn execute(&self, context: &ExecutionContext) -> Result<TaskOutcome>;
}

/// Run one VM's handlers in order, stopping at the first failure.
pub async fn run_tasks(
    handlers: &[Box<dyn TaskHandler>],
    context: &ExecutionContext,
) -> Result<Vec<TaskOutcome>> {
    let mut outcomes = Vec::with_capacity(handlers.len());
    for handler in handlers {
        tracing::info!(vm = %context.vm, task = handler.name(), "Running task");
        match handler.execute(context).await {
            Ok(outcome) => {
                tracing::debug!(task = handler.name(), status = ?outcome.status, "Task finished");
                outcomes.push(outcome);
            }
            Err(e) => {
                tracing::warn!(vm = %context.vm, task = handler.name(), error = %e, "Task failed");
                return Err(e);
            }
        }
    }
    Ok(outcomes)
}
