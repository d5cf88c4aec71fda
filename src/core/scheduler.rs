// src/core/scheduler.rs

use crate::{
    constants::CONFIGURATION_SEPARATOR,
    core::{
        builder::{BinderError, BuilderRuntime, InstallationChecker, OptionSchemaBinder, RuntimeError},
        error_translator,
        errors::CommandError,
        override_parser::parse_arguments,
        specifier::TargetSpecifier,
    },
    models::{BuilderSchema, OptionMap, ParsedOverrides, Project, RunRequest, TargetDefinition, Workspace},
};
use colored::*;
use serde_json::Value;

/// Runs resolved targets, one builder run at a time.
pub struct Scheduler<'a> {
    workspace: &'a Workspace,
    binder: &'a dyn OptionSchemaBinder,
    runtime: &'a dyn BuilderRuntime,
    installs: &'a dyn InstallationChecker,
}

impl std::fmt::Debug for Scheduler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("workspace", &self.workspace.root)
            .finish_non_exhaustive()
    }
}

impl<'a> Scheduler<'a> {
    pub fn new(
        workspace: &'a Workspace,
        binder: &'a dyn OptionSchemaBinder,
        runtime: &'a dyn BuilderRuntime,
        installs: &'a dyn InstallationChecker,
    ) -> Self {
        Self {
            workspace,
            binder,
            runtime,
            installs,
        }
    }

    /// Runs the target on every project in `projects`, strictly in order.
    ///
    /// A failing builder run does not stop the sequence; the overall result is
    /// a failure if any run failed. Fatal errors (unknown options, missing
    /// builders, invalid options) abort the sequence immediately.
    pub async fn run_sequential(
        &self,
        specifier: &TargetSpecifier,
        projects: &[String],
        overrides: &[String],
    ) -> Result<bool, CommandError> {
        let mut all_succeeded = true;
        for project in projects {
            println!(
                "{} {}",
                "→".blue(),
                format!(
                    t!("run.info.running_on_project"),
                    target = specifier.target,
                    project = project
                )
                .bold()
            );
            let succeeded = self
                .run_single(&specifier.with_project(project), overrides)
                .await?;
            all_succeeded &= succeeded;
        }
        Ok(all_succeeded)
    }

    /// Runs the target once on the specifier's project.
    ///
    /// Builder defaults (schema defaults, target options, configurations) are
    /// merged under the parsed overrides, which win on every key.
    pub async fn run_single(
        &self,
        specifier: &TargetSpecifier,
        overrides: &[String],
    ) -> Result<bool, CommandError> {
        let project = self
            .workspace
            .project(&specifier.project)
            .ok_or_else(|| CommandError::ProjectNotFound(specifier.project.clone()))?;
        let definition = project.targets.get(&specifier.target).ok_or_else(|| {
            CommandError::ProjectMissingTarget {
                project: project.name.clone(),
                target: specifier.target.clone(),
            }
        })?;

        let builder = match self.binder.resolve_builder(project, &specifier.target).await {
            Ok(builder) => builder,
            Err(BinderError::ModuleNotFound { builder, .. }) => {
                return Err(error_translator::missing_builder(
                    &builder,
                    &self.workspace.root,
                    self.installs,
                ));
            }
            Err(other) => return Err(other.into()),
        };
        let schema = self.binder.schema_for(&builder).await?;

        let parsed = parse_arguments(overrides, &schema.options);
        let (command_options, extra_args) = accept_leftovers(&schema, parsed)?;

        let (target_options, configuration) = target_defaults(project, &specifier.target, definition, &specifier.configuration)?;
        let mut options = schema.defaults();
        options.extend(target_options);
        options.extend(command_options.clone());

        log::debug!(
            "Scheduling {} with builder {} and options {:?}",
            specifier,
            builder,
            options
        );

        let request = RunRequest {
            project: project.name.clone(),
            project_root: self.workspace.root.join(&project.root),
            target: specifier.target.clone(),
            configuration,
            builder,
            options,
            extra_args,
        };

        let mut run = match self.runtime.schedule(request).await {
            Ok(run) => run,
            Err(RuntimeError::Validation(violations)) => {
                return Err(error_translator::translate_violations(
                    violations,
                    &command_options,
                ));
            }
            Err(other) => return Err(other.into()),
        };

        let result = run.result().await;
        run.dispose().await;

        if let Some(error) = &result.error {
            log::error!("{}", error);
        }
        Ok(result.success)
    }
}

/// Splits leftovers into extra options and bare arguments, or rejects them
/// when the schema does not accept undeclared properties.
fn accept_leftovers(
    schema: &BuilderSchema,
    parsed: ParsedOverrides,
) -> Result<(OptionMap, Vec<String>), CommandError> {
    let ParsedOverrides {
        mut options,
        leftovers,
    } = parsed;

    if leftovers.is_empty() {
        return Ok((options, Vec::new()));
    }
    if !schema.additional_properties {
        return Err(error_translator::unknown_options(&leftovers));
    }

    let mut extra_args = Vec::new();
    for token in leftovers {
        match token.strip_prefix("--").filter(|name| !name.is_empty()) {
            Some(flag) => {
                let (name, value) = match flag.split_once('=') {
                    Some((name, raw)) => (name, loose_value(raw)),
                    None => (flag, Value::Bool(true)),
                };
                options.insert(name.to_string(), value);
            }
            None => extra_args.push(token),
        }
    }
    Ok((options, extra_args))
}

/// Best-effort typing of an undeclared option's value.
fn loose_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

/// The target's own options with each requested configuration layered on top.
/// Returns the options and the configuration string that was applied.
pub fn target_defaults(
    project: &Project,
    target: &str,
    definition: &TargetDefinition,
    requested: &str,
) -> Result<(OptionMap, String), CommandError> {
    let configuration = if requested.is_empty() {
        definition.default_configuration.clone().unwrap_or_default()
    } else {
        requested.to_string()
    };

    let mut options = definition.options.clone();
    for name in configuration
        .split(CONFIGURATION_SEPARATOR)
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        let overlay = definition.configurations.get(name).ok_or_else(|| {
            CommandError::ConfigurationNotFound {
                project: project.name.clone(),
                target: target.to_string(),
                configuration: name.to_string(),
            }
        })?;
        options.extend(overlay.clone());
    }

    Ok((options, configuration))
}
