// src/core/errors.rs

use crate::core::{
    builder::{BinderError, RuntimeError},
    specifier::SpecifierError,
};
use colored::*;
use thiserror::Error;

/// Every way a target command can fail fatally.
#[derive(Error, Debug)]
pub enum CommandError {
    // --- Configuration errors ---
    #[error(transparent)]
    Specifier(#[from] SpecifierError),
    #[error("Project '{0}' does not exist in the workspace.")]
    ProjectNotFound(String),
    #[error("Project '{project}' does not support the '{target}' target.")]
    ProjectMissingTarget { project: String, target: String },
    #[error("No projects support the '{0}' target.")]
    NoProjectSupportsTarget(String),
    #[error(
        "Configuration '{configuration}' is not set for target '{target}' of project '{project}'."
    )]
    ConfigurationNotFound {
        project: String,
        target: String,
        configuration: String,
    },
    #[error(
        "Cannot determine project for the '{0}' target. Pass --project or set 'default_project' in the workspace."
    )]
    CannotDetermineProject(String),

    // --- Ambiguity ---
    #[error(
        "Commands with command line overrides cannot target different builders. The '{target}' target would run on projects {projects} which use the builders:\n  {builders}"
    )]
    BuilderConflict {
        target: String,
        projects: String,
        builders: String,
    },

    // --- Builder / option errors ---
    #[error("Could not find the '{builder}' builder's package.")]
    MissingBuilder {
        builder: String,
        /// Installation-state hint printed before the fatal message.
        hint: Option<String>,
    },
    #[error("{}", .0.join("\n"))]
    UnknownOptions(Vec<String>),
    #[error("{}", .0.join("\n"))]
    InvalidOptions(Vec<String>),

    // --- Anything else a collaborator reports ---
    #[error(transparent)]
    Binder(#[from] BinderError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl CommandError {
    /// The lines to print for this error, in order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::UnknownOptions(lines) | Self::InvalidOptions(lines) => lines.clone(),
            Self::MissingBuilder {
                hint: Some(hint), ..
            } => vec![hint.clone(), self.to_string()],
            other => vec![other.to_string()],
        }
    }
}

/// Prints a fatal error to stderr, one styled line per message.
pub fn report_fatal(error: &CommandError) {
    log::debug!("Fatal command error: {:?}", error);
    for message in error.messages() {
        eprintln!("{}: {}", "Error".red().bold(), message);
    }
}
