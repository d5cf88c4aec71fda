// src/core/test_support.rs

//! In-memory collaborators shared by the engine's unit tests.

use crate::{
    core::{
        builder::{
            BinderError, BuilderRun, BuilderRuntime, InstallationChecker, OptionSchemaBinder,
            RuntimeError,
        },
        schema::SchemaViolation,
    },
    models::{
        BuilderId, BuilderSchema, ExecutionResult, OptionDefinition, OptionType, Project,
        RunRequest, TargetDefinition, Workspace,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub(crate) fn tokens(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn boolean(name: &str) -> OptionDefinition {
    OptionDefinition {
        name: name.to_string(),
        kind: OptionType::Boolean,
        ..Default::default()
    }
}

pub(crate) fn integer(name: &str) -> OptionDefinition {
    OptionDefinition {
        name: name.to_string(),
        kind: OptionType::Integer,
        ..Default::default()
    }
}

pub(crate) fn positional_enum(name: &str, index: usize, values: &[&str]) -> OptionDefinition {
    OptionDefinition {
        name: name.to_string(),
        positional: Some(index),
        enum_values: tokens(values),
        ..Default::default()
    }
}

/// Builds a workspace from `(project, target, builder)` rows, in row order.
pub(crate) fn workspace(rows: &[(&str, &str, &str)]) -> Workspace {
    let mut ws = Workspace {
        root: ".".into(),
        ..Default::default()
    };
    for (project, target, builder) in rows {
        let definition = TargetDefinition {
            builder: builder.to_string(),
            ..Default::default()
        };
        match ws.projects.iter_mut().find(|p| p.name == *project) {
            Some(existing) => {
                existing.targets.insert(target.to_string(), definition);
            }
            None => ws.projects.push(Project {
                name: project.to_string(),
                root: project.to_string().into(),
                targets: [(target.to_string(), definition)].into(),
            }),
        }
    }
    ws
}

/// Resolves builders from the workspace and schemas from a fixed table.
/// Packages without any registered schema are reported as missing.
#[derive(Debug, Default)]
pub(crate) struct FakeBinder {
    schemas: HashMap<BuilderId, BuilderSchema>,
}

impl FakeBinder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_schema(self, builder: &str, options: Vec<OptionDefinition>) -> Self {
        self.with(builder, options, false)
    }

    pub(crate) fn with_open_schema(self, builder: &str, options: Vec<OptionDefinition>) -> Self {
        self.with(builder, options, true)
    }

    fn with(mut self, builder: &str, options: Vec<OptionDefinition>, open: bool) -> Self {
        let id = BuilderId::parse(builder).unwrap();
        self.schemas.insert(
            id,
            BuilderSchema {
                description: None,
                options,
                additional_properties: open,
            },
        );
        self
    }
}

#[async_trait]
impl OptionSchemaBinder for FakeBinder {
    async fn resolve_builder(
        &self,
        project: &Project,
        target: &str,
    ) -> Result<BuilderId, BinderError> {
        let definition = project
            .targets
            .get(target)
            .ok_or_else(|| BinderError::MissingTarget {
                project: project.name.clone(),
                target: target.to_string(),
            })?;
        let id = BuilderId::parse(&definition.builder)
            .ok_or_else(|| BinderError::InvalidBuilderId(definition.builder.clone()))?;
        if !self.schemas.keys().any(|known| known.package == id.package) {
            return Err(BinderError::ModuleNotFound {
                builder: definition.builder.clone(),
                package: id.package,
            });
        }
        Ok(id)
    }

    async fn schema_for(&self, builder: &BuilderId) -> Result<BuilderSchema, BinderError> {
        self.schemas
            .get(builder)
            .cloned()
            .ok_or_else(|| BinderError::UnknownBuilder {
                package: builder.package.clone(),
                name: builder.name.clone(),
            })
    }
}

/// Records every request and answers with a per-project outcome (success by default).
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeRuntime {
    pub(crate) requests: Arc<Mutex<Vec<RunRequest>>>,
    pub(crate) disposed: Arc<Mutex<usize>>,
    outcomes: HashMap<String, ExecutionResult>,
    violations: Vec<SchemaViolation>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(mut self, project: &str, error: &str) -> Self {
        self.outcomes
            .insert(project.to_string(), ExecutionResult::failed(error));
        self
    }

    pub(crate) fn rejecting(mut self, violations: Vec<SchemaViolation>) -> Self {
        self.violations = violations;
        self
    }

    pub(crate) fn ran_projects(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.project.clone())
            .collect()
    }

    pub(crate) fn last_request(&self) -> Option<RunRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl BuilderRuntime for FakeRuntime {
    async fn schedule(&self, request: RunRequest) -> Result<Box<dyn BuilderRun>, RuntimeError> {
        if !self.violations.is_empty() {
            return Err(RuntimeError::Validation(self.violations.clone()));
        }
        let outcome = self
            .outcomes
            .get(&request.project)
            .cloned()
            .unwrap_or_else(ExecutionResult::succeeded);
        self.requests.lock().unwrap().push(request);
        Ok(Box::new(FakeRun {
            outcome,
            disposed: Arc::clone(&self.disposed),
        }))
    }
}

struct FakeRun {
    outcome: ExecutionResult,
    disposed: Arc<Mutex<usize>>,
}

#[async_trait]
impl BuilderRun for FakeRun {
    async fn result(&mut self) -> ExecutionResult {
        self.outcome.clone()
    }

    async fn dispose(&mut self) {
        *self.disposed.lock().unwrap() += 1;
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeInstalls(pub(crate) bool);

impl InstallationChecker for FakeInstalls {
    fn has_installed_dependencies(&self, _base_path: &Path) -> bool {
        self.0
    }
}
