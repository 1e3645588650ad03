//! Shared test utilities for the ravtest workspace.
//!
//! This crate provides standardised test fixtures so crate test suites do
//! not each hand-roll project directories. It is a dev-dependency only and
//! never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`](project::TestProject) builder for a project
//!   root with a manifest and language marker files
//! - [`manifests`]: canned manifest documents

pub mod manifests;
pub mod project;

pub use project::TestProject;
