//! Task handlers for ravtest workflows.
//!
//! Every task of an expanded manifest names a handler class. This crate
//! provides:
//!
//! - [`TaskHandler`]: the capability interface each class implements
//! - [`TaskRegistry`]: class identifiers mapped to handler constructors
//! - [`ExecutionContext`]: the immutable per-VM state handed to handlers
//! - [`CommandRunner`]: the seam to whatever transport reaches the VM
//!
//! # Example
//!
//! ```ignore
//! let registry = TaskRegistry::with_builtins();
//! let handlers = registry.build_vm(vm)?;
//! let context = ExecutionContext::new(app, vm, language, Target::new(host), runner);
//! let outcomes = run_tasks(&handlers, &context).await?;
//! ```

pub mod builtin;
pub mod context;
pub mod error;
pub mod handler;
pub mod registry;
pub mod runner;

#[cfg(test)]
mod testing;

pub use builtin::{DeployTask, ShellTask, SysinitTask};
pub use context::{ExecutionContext, Target};
pub use error::{Error, Result};
pub use handler::{TaskHandler, TaskOutcome, TaskStatus, run_tasks};
pub use registry::{HandlerFactory, TaskRegistry};
pub use runner::{CommandOutput, CommandRequest, CommandRunner, LocalRunner, Recorded, RecordingRunner};
