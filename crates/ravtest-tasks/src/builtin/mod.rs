//! Handlers for the class identifiers of the default manifest

mod deploy;
mod shell;
mod sysinit;

pub use deploy::{DEPLOY_TASK_CLASS, DeployTask};
pub use shell::ShellTask;
pub use sysinit::{SYSINIT_TASK_CLASS, SysinitTask};

pub(crate) use sysinit::is_marker;
