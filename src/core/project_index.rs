// src/core/project_index.rs

use crate::models::{Project, Workspace};

/// Read-only lookups of which projects expose which targets.
#[derive(Debug, Clone, Copy)]
pub struct ProjectTargetIndex<'a> {
    workspace: &'a Workspace,
}

impl<'a> ProjectTargetIndex<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Names of every project declaring `target`, in workspace order.
    pub fn projects_supporting(&self, target: &str) -> Vec<String> {
        self.workspace
            .projects
            .iter()
            .filter(|p| p.has_target(target))
            .map(|p| p.name.clone())
            .collect()
    }

    /// The workspace's `default_project` extension, or an empty string.
    pub fn default_project(&self) -> String {
        self.workspace
            .extension("default_project")
            .and_then(toml::Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn project(&self, name: &str) -> Option<&'a Project> {
        self.workspace.project(name)
    }
}
