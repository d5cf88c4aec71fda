// src/core/builder.rs

//! Seams between the resolution engine and the code that knows about builders.
//!
//! The engine only ever talks to builders through these traits: it asks an
//! [`OptionSchemaBinder`] which builder a target uses and what options it
//! accepts, hands the merged options to a [`BuilderRuntime`], and awaits the
//! [`BuilderRun`] it gets back. Concrete implementations live in `system`.

use crate::{
    core::schema::SchemaViolation,
    models::{BuilderId, BuilderSchema, ExecutionResult, Project, RunRequest},
};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinderError {
    /// The package that should provide the builder is not installed.
    #[error("Could not find the '{package}' package providing builder '{builder}'.")]
    ModuleNotFound { builder: String, package: String },
    #[error("'{0}' is not a valid builder id. Expected 'package:name'.")]
    InvalidBuilderId(String),
    #[error("Package '{package}' does not provide a builder named '{name}'.")]
    UnknownBuilder { package: String, name: String },
    #[error("Project '{project}' does not declare a '{target}' target.")]
    MissingTarget { project: String, target: String },
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Schema validation failed:\n  {}", format_violations(.0))]
    Validation(Vec<SchemaViolation>),
    #[error(transparent)]
    Binder(#[from] BinderError),
    #[error("Could not prepare builder '{builder}': {reason}")]
    Preparation { builder: String, reason: String },
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  ")
}

/// Resolves which builder a target uses and the option schema of a builder.
#[async_trait]
pub trait OptionSchemaBinder: Send + Sync {
    /// The builder bound to `target` on `project`.
    ///
    /// Fails with [`BinderError::ModuleNotFound`] when the builder's package is absent.
    async fn resolve_builder(&self, project: &Project, target: &str)
    -> Result<BuilderId, BinderError>;

    async fn schema_for(&self, builder: &BuilderId) -> Result<BuilderSchema, BinderError>;
}

/// Starts builder runs.
#[async_trait]
pub trait BuilderRuntime: Send + Sync {
    /// Validates `request` and prepares a run. Nothing executes until
    /// [`BuilderRun::result`] is awaited.
    async fn schedule(&self, request: RunRequest) -> Result<Box<dyn BuilderRun>, RuntimeError>;
}

/// A scheduled builder run.
#[async_trait]
pub trait BuilderRun: Send {
    /// Drives the run to completion.
    async fn result(&mut self) -> ExecutionResult;

    /// Releases whatever the run still holds. Safe to call after `result`.
    async fn dispose(&mut self);
}

/// Inspects whether a workspace had its dependencies installed.
pub trait InstallationChecker: Send + Sync {
    fn has_installed_dependencies(&self, base_path: &Path) -> bool;
}
