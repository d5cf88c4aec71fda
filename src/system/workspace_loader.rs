// src/system/workspace_loader.rs

//! # Workspace Loader
//!
//! Finds the `xrun.toml` that governs an invocation and turns it into a
//! [`Workspace`]. Lookup order:
//!
//! 1. An explicit path (the `--workspace` flag), either the file or its directory.
//! 2. The `XRUN_WORKSPACE` environment variable.
//! 3. The nearest `xrun.toml` in the current directory or any of its ancestors.
//!
//! Projects keep the order in which the file declares them.

use crate::{
    constants::{WORKSPACE_ENV_VAR, WORKSPACE_FILENAME},
    models::{BuilderDeclaration, Project, TargetDefinition, Workspace},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("No 'xrun.toml' found in '{0}' or any parent directory.")]
    NotFound(PathBuf),
    #[error("Workspace file '{0}' does not exist.")]
    MissingFile(PathBuf),
    #[error("Could not read workspace file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse workspace file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Project '{project}' is invalid: {source}")]
    InvalidProject {
        project: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Debug, Default)]
struct RawWorkspace {
    #[serde(default)]
    projects: toml::Table,
    #[serde(default)]
    builders: BTreeMap<String, BTreeMap<String, BuilderDeclaration>>,
    #[serde(flatten)]
    extensions: toml::Table,
}

#[derive(Deserialize, Debug, Default)]
struct RawProject {
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    targets: BTreeMap<String, TargetDefinition>,
}

/// Locates and loads the workspace for this invocation.
pub fn discover(explicit: Option<&Path>) -> Result<Workspace, WorkspaceError> {
    let path = locate(explicit, env::var_os(WORKSPACE_ENV_VAR).as_deref(), || {
        env::current_dir().map_err(|source| WorkspaceError::Read {
            path: PathBuf::from("."),
            source,
        })
    })?;
    load_workspace(&path)
}

/// Picks the workspace file: the flag, then the environment value, then a
/// search upwards from the directory `cwd` returns.
fn locate(
    explicit: Option<&Path>,
    from_env: Option<&OsStr>,
    cwd: impl FnOnce() -> Result<PathBuf, WorkspaceError>,
) -> Result<PathBuf, WorkspaceError> {
    if let Some(path) = explicit {
        return resolve_explicit(path);
    }
    if let Some(value) = from_env {
        log::debug!("Using workspace from {}", WORKSPACE_ENV_VAR);
        return resolve_explicit(Path::new(value));
    }
    find_upwards(&cwd()?)
}

fn resolve_explicit(path: &Path) -> Result<PathBuf, WorkspaceError> {
    let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    let file = if path.is_dir() {
        path.join(WORKSPACE_FILENAME)
    } else {
        path
    };
    if file.is_file() {
        Ok(file)
    } else {
        Err(WorkspaceError::MissingFile(file))
    }
}

/// Walks up from `start` looking for a workspace file.
pub fn find_upwards(start: &Path) -> Result<PathBuf, WorkspaceError> {
    start
        .ancestors()
        .map(|dir| dir.join(WORKSPACE_FILENAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| WorkspaceError::NotFound(start.to_path_buf()))
}

/// Reads and parses the workspace file at `path`.
pub fn load_workspace(path: &Path) -> Result<Workspace, WorkspaceError> {
    log::debug!("Loading workspace from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|source| WorkspaceError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let root = dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

    parse_workspace(&content, root).map_err(|e| match e {
        WorkspaceError::Parse { source, .. } => WorkspaceError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parses workspace file contents. Project roots are kept relative to `root`.
pub fn parse_workspace(content: &str, root: PathBuf) -> Result<Workspace, WorkspaceError> {
    let raw: RawWorkspace = toml::from_str(content).map_err(|source| WorkspaceError::Parse {
        path: root.join(WORKSPACE_FILENAME),
        source,
    })?;

    let mut projects = Vec::with_capacity(raw.projects.len());
    for (name, value) in raw.projects {
        let project: RawProject = value
            .try_into()
            .map_err(|source| WorkspaceError::InvalidProject {
                project: name.clone(),
                source,
            })?;
        projects.push(Project {
            root: project.root.unwrap_or_else(|| PathBuf::from(&name)),
            name,
            targets: project.targets,
        });
    }

    log::debug!(
        "Workspace has {} project(s) and {} builder package(s)",
        projects.len(),
        raw.builders.len()
    );

    Ok(Workspace {
        root,
        projects,
        builders: raw.builders,
        extensions: raw.extensions,
    })
}
