//! Manifest resolution for ravtest
//!
//! This crate turns a project's `.ravello.yml` into a fully expanded,
//! validated description of the applications, VMs and per-VM workflows to
//! run. It implements:
//!
//! - **Default manifest**: the built-in defaults, parsed once per process
//! - **Language detection**: marker files such as `setup.py` select a language
//! - **Layered merge**: global defaults < language defaults < user manifest
//! - **Short-hand expansion**: `sysinit: [...]` becomes the `sysinit` task
//! - **Validation**: every schema and naming error, reported together
//!
//! # Architecture
//!
//! ```text
//!   defaults.yml      .ravello.yml      project root
//!        |                 |                 |
//!  DefaultManifest    UserManifest    LanguageDetector
//!        \                 |                 /
//!         +-------------Resolver------------+
//!                          |
//!                  ExpandedManifest
//! ```
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use ravtest_manifest::{DefaultManifest, Resolver};
//!
//! let defaults = DefaultManifest::builtin().unwrap();
//! let expanded = Resolver::new(defaults)
//!     .resolve_str(
//!         "language: python\napplications:\n- name: unittest\n  vms:\n  - name: vm1\n    image: ubuntu1204\n",
//!         Path::new("."),
//!     )
//!     .unwrap();
//!
//! let vm = &expanded.applications[0].vms[0];
//! assert_eq!(vm.task("execute").unwrap().commands, vec!["python setup.py test"]);
//! ```

pub mod defaults;
pub mod detect;
pub mod error;
pub mod layer;
pub mod manifest;
pub mod model;
mod reader;
pub mod resolver;
pub mod services;
mod validation;

pub use defaults::{BUILTIN_DEFAULTS, DefaultManifest, LanguageDefaults};
pub use detect::LanguageDetector;
pub use error::{Error, NameScope, ResolutionError, ResolutionErrors, Result};
pub use manifest::{MANIFEST_FILENAME, UserManifest};
pub use model::{
    Application, ExpandedManifest, FALLBACK_KEEPALIVE, Language, NODEFAULTS, SHELL_TASK_CLASS,
    Service, Task, VirtualMachine,
};
pub use resolver::{Resolver, resolve};
