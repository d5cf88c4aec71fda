// src/system/registry.rs

//! Knows every builder available to a workspace.
//!
//! The `xrun` package is compiled in and always present. Any other package
//! exists only if the workspace declares it under `[builders.<package>]`.

use crate::{
    constants::BUILTIN_PACKAGE,
    core::builder::{BinderError, OptionSchemaBinder},
    models::{
        BuilderDeclaration, BuilderId, BuilderSchema, OptionDefinition, OptionType, Project,
        Workspace,
    },
};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Runs an executable with `args`, appending any extra options as flags.
pub const COMMAND_BUILDER: &str = "command";
/// Prints a message and the options it was given.
pub const ECHO_BUILDER: &str = "echo";

/// How a builder runs, once resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderKind {
    Command,
    Echo,
    Declared(BuilderDeclaration),
}

#[derive(Debug, Clone, Default)]
pub struct BuilderRegistry {
    declared: BTreeMap<String, BTreeMap<String, BuilderDeclaration>>,
}

impl BuilderRegistry {
    pub fn new(workspace: &Workspace) -> Self {
        Self {
            declared: workspace.builders.clone(),
        }
    }

    pub fn has_package(&self, package: &str) -> bool {
        package == BUILTIN_PACKAGE || self.declared.contains_key(package)
    }

    /// Finds how `builder` runs.
    pub fn kind(&self, builder: &BuilderId) -> Result<BuilderKind, BinderError> {
        let unknown = || BinderError::UnknownBuilder {
            package: builder.package.clone(),
            name: builder.name.clone(),
        };

        if builder.package == BUILTIN_PACKAGE {
            return match builder.name.as_str() {
                COMMAND_BUILDER => Ok(BuilderKind::Command),
                ECHO_BUILDER => Ok(BuilderKind::Echo),
                _ => Err(unknown()),
            };
        }

        let package = self
            .declared
            .get(&builder.package)
            .ok_or_else(|| BinderError::ModuleNotFound {
                builder: builder.to_string(),
                package: builder.package.clone(),
            })?;
        package
            .get(&builder.name)
            .cloned()
            .map(BuilderKind::Declared)
            .ok_or_else(unknown)
    }

    pub fn schema(&self, builder: &BuilderId) -> Result<BuilderSchema, BinderError> {
        Ok(match self.kind(builder)? {
            BuilderKind::Command => command_schema(),
            BuilderKind::Echo => echo_schema(),
            BuilderKind::Declared(declaration) => BuilderSchema {
                description: declaration.description,
                options: declaration.options,
                additional_properties: declaration.additional_properties,
            },
        })
    }

    /// Every builder id the registry can run, built-ins first.
    pub fn builder_ids(&self) -> Vec<BuilderId> {
        let builtins = [COMMAND_BUILDER, ECHO_BUILDER].map(|name| BuilderId {
            package: BUILTIN_PACKAGE.to_string(),
            name: name.to_string(),
        });
        let declared = self.declared.iter().flat_map(|(package, builders)| {
            builders.keys().map(|name| BuilderId {
                package: package.clone(),
                name: name.clone(),
            })
        });
        builtins.into_iter().chain(declared).collect()
    }
}

#[async_trait]
impl OptionSchemaBinder for BuilderRegistry {
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

        if !self.has_package(&id.package) {
            return Err(BinderError::ModuleNotFound {
                builder: definition.builder.clone(),
                package: id.package,
            });
        }
        Ok(id)
    }

    async fn schema_for(&self, builder: &BuilderId) -> Result<BuilderSchema, BinderError> {
        self.schema(builder)
    }
}

fn option(name: &str, kind: OptionType, description: &str) -> OptionDefinition {
    OptionDefinition {
        name: name.to_string(),
        kind,
        description: Some(description.to_string()),
        ..Default::default()
    }
}

fn command_schema() -> BuilderSchema {
    BuilderSchema {
        description: Some("Runs an executable in the project root.".to_string()),
        options: vec![
            OptionDefinition {
                required: true,
                ..option("command", OptionType::String, "Executable or command line to run.")
            },
            option("args", OptionType::Array, "Arguments passed before any extra flags."),
            option("cwd", OptionType::String, "Working directory, relative to the project root."),
        ],
        additional_properties: true,
    }
}

fn echo_schema() -> BuilderSchema {
    BuilderSchema {
        description: Some("Prints a message and the resolved options.".to_string()),
        options: vec![
            OptionDefinition {
                positional: Some(0),
                ..option("message", OptionType::String, "Text to print.")
            },
            OptionDefinition {
                aliases: vec!["j".to_string()],
                ..option("json", OptionType::Boolean, "Print the options as JSON.")
            },
        ],
        additional_properties: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetDefinition;

    fn registry() -> BuilderRegistry {
        let mut workspace = Workspace::default();
        workspace.builders.insert(
            "cargo".to_string(),
            [(
                "test".to_string(),
                BuilderDeclaration {
                    command: "cargo test".to_string(),
                    options: vec![option("release", OptionType::Boolean, "Release mode.")],
                    ..Default::default()
                },
            )]
            .into(),
        );
        BuilderRegistry::new(&workspace)
    }

    fn project(builder: &str) -> Project {
        Project {
            name: "app".to_string(),
            root: "app".into(),
            targets: [(
                "test".to_string(),
                TargetDefinition {
                    builder: builder.to_string(),
                    ..Default::default()
                },
            )]
            .into(),
        }
    }

    #[tokio::test]
    async fn test_resolves_builtin_and_declared_builders() {
        let registry = registry();
        let id = registry.resolve_builder(&project("xrun:echo"), "test").await.unwrap();
        assert_eq!(registry.kind(&id).unwrap(), BuilderKind::Echo);

        let id = registry.resolve_builder(&project("cargo:test"), "test").await.unwrap();
        let schema = registry.schema_for(&id).await.unwrap();
        assert_eq!(schema.options.len(), 1);
        assert!(!schema.additional_properties);
    }

    #[tokio::test]
    async fn test_unknown_package_is_module_not_found() {
        let registry = registry();
        let error = registry
            .resolve_builder(&project("npm:jest"), "test")
            .await
            .unwrap_err();
        assert!(matches!(error, BinderError::ModuleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_other_failures_are_distinct() {
        let registry = registry();
        let error = registry
            .resolve_builder(&project("not-an-id"), "test")
            .await
            .unwrap_err();
        assert_eq!(error, BinderError::InvalidBuilderId("not-an-id".to_string()));

        let error = registry.resolve_builder(&project("xrun:echo"), "lint").await.unwrap_err();
        assert!(matches!(error, BinderError::MissingTarget { .. }));

        let id = BuilderId::parse("cargo:bench").unwrap();
        assert!(matches!(
            registry.schema_for(&id).await,
            Err(BinderError::UnknownBuilder { .. })
        ));
    }

    #[test]
    fn test_builder_ids_lists_builtins_first() {
        let ids: Vec<String> = registry().builder_ids().iter().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["xrun:command", "xrun:echo", "cargo:test"]);
    }
}
