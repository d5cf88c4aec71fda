// src/core/target_runner.rs

//! The single entry point target commands go through.
//!
//! `run_target` turns raw command options into a target specifier, decides
//! which project(s) the invocation means and hands them to the [`Scheduler`].
//! Every fatal condition is reported here and mapped to an exit code.

use crate::{
    constants::{EXIT_FAILURE, EXIT_SUCCESS},
    core::{
        builder::{BinderError, BuilderRuntime, InstallationChecker, OptionSchemaBinder},
        disambiguation::disambiguate,
        error_translator,
        errors::{CommandError, report_fatal},
        help,
        project_index::ProjectTargetIndex,
        scheduler::Scheduler,
        specifier::TargetSpecifier,
    },
    models::{BuilderId, CommandOptions, Workspace},
};

/// Caller-overridable reactions of the runner.
pub trait CommandHooks: Send + Sync {
    /// Called when the requested target is not available: on `project` when one
    /// was named, or on any project of the workspace otherwise. Returns the exit code.
    fn on_missing_target(&self, target: &str, project: Option<&str>) -> i32 {
        let error = match project {
            Some(project) => CommandError::ProjectMissingTarget {
                project: project.to_string(),
                target: target.to_string(),
            },
            None => CommandError::NoProjectSupportsTarget(target.to_string()),
        };
        report_fatal(&error);
        EXIT_FAILURE
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl CommandHooks for DefaultHooks {}

/// Which projects an invocation resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Run once on this project.
    Single(String),
    /// Run on every listed project, in order.
    Each(Vec<String>),
    /// Nothing to run; this is the exit code.
    Done(i32),
}

pub struct TargetRunner<'a> {
    workspace: &'a Workspace,
    binder: &'a dyn OptionSchemaBinder,
    runtime: &'a dyn BuilderRuntime,
    installs: &'a dyn InstallationChecker,
    hooks: &'a dyn CommandHooks,
}

impl std::fmt::Debug for TargetRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRunner")
            .field("workspace", &self.workspace.root)
            .finish_non_exhaustive()
    }
}

impl<'a> TargetRunner<'a> {
    pub fn new(
        workspace: &'a Workspace,
        binder: &'a dyn OptionSchemaBinder,
        runtime: &'a dyn BuilderRuntime,
        installs: &'a dyn InstallationChecker,
        hooks: &'a dyn CommandHooks,
    ) -> Self {
        Self {
            workspace,
            binder,
            runtime,
            installs,
            hooks,
        }
    }

    /// Runs `fixed_target` (or the target named in `options`) and returns the exit code.
    /// Fatal errors are printed before returning.
    pub async fn run_target(
        &self,
        fixed_target: Option<&str>,
        multi_target: bool,
        options: CommandOptions,
    ) -> i32 {
        match self.try_run_target(fixed_target, multi_target, options).await {
            Ok(code) => code,
            Err(error) => {
                report_fatal(&error);
                EXIT_FAILURE
            }
        }
    }

    pub async fn try_run_target(
        &self,
        fixed_target: Option<&str>,
        multi_target: bool,
        options: CommandOptions,
    ) -> Result<i32, CommandError> {
        let specifier = TargetSpecifier::from_options(fixed_target, &options)?;
        let (resolution, overrides) = self
            .resolve(&specifier, multi_target, options.help, &options.overrides)
            .await?;

        log::debug!("Resolved '{}' to {:?}", specifier.target, resolution);

        let scheduler = Scheduler::new(self.workspace, self.binder, self.runtime, self.installs);
        let succeeded = match resolution {
            Resolution::Done(code) => return Ok(code),
            Resolution::Single(project) if options.help => {
                self.print_help(&project, &specifier.target).await?;
                return Ok(EXIT_SUCCESS);
            }
            Resolution::Single(project) => {
                scheduler
                    .run_single(&specifier.with_project(&project), &overrides)
                    .await?
            }
            Resolution::Each(projects) => {
                scheduler
                    .run_sequential(&specifier, &projects, &overrides)
                    .await?
            }
        };

        Ok(if succeeded { EXIT_SUCCESS } else { EXIT_FAILURE })
    }

    /// Decides which project(s) to run and returns the overrides to pass on,
    /// with a project selector token stripped when one was found.
    pub async fn resolve(
        &self,
        specifier: &TargetSpecifier,
        multi_target: bool,
        help_requested: bool,
        overrides: &[String],
    ) -> Result<(Resolution, Vec<String>), CommandError> {
        let index = ProjectTargetIndex::new(self.workspace);
        let target = specifier.target.as_str();

        if specifier.has_project() {
            let project = index
                .project(&specifier.project)
                .ok_or_else(|| CommandError::ProjectNotFound(specifier.project.clone()))?;
            if !project.has_target(target) {
                let code = self.hooks.on_missing_target(target, Some(&project.name));
                return Ok((Resolution::Done(code), overrides.to_vec()));
            }
            return Ok((Resolution::Single(project.name.clone()), overrides.to_vec()));
        }

        let candidates = index.projects_supporting(target);
        log::debug!("Projects supporting '{}': {:?}", target, candidates);

        if candidates.is_empty() {
            let code = self.hooks.on_missing_target(target, None);
            return Ok((Resolution::Done(code), overrides.to_vec()));
        }
        if let [only] = candidates.as_slice() {
            return Ok((Resolution::Single(only.clone()), overrides.to_vec()));
        }

        let mut overrides = overrides.to_vec();
        if !overrides.is_empty() {
            let outcome = disambiguate(self.workspace, self.binder, target, &candidates, &overrides)
                .await
                .map_err(|e| self.binder_failure(e))?;

            if let Some(project) = outcome.project {
                return Ok((Resolution::Single(project), outcome.overrides));
            }
            overrides = outcome.overrides;

            if multi_target && outcome.builders.len() > 1 {
                return Err(builder_conflict(target, &candidates, &outcome.builders));
            }
        }

        if multi_target {
            if help_requested {
                help::print_candidates(target, &candidates);
                return Ok((Resolution::Done(EXIT_SUCCESS), overrides));
            }
            return Ok((Resolution::Each(candidates), overrides));
        }

        let default_project = index.default_project();
        if candidates.contains(&default_project) {
            log::debug!("Falling back to default project '{}'", default_project);
            return Ok((Resolution::Single(default_project), overrides));
        }

        if help_requested {
            help::print_candidates(target, &candidates);
            return Ok((Resolution::Done(EXIT_SUCCESS), overrides));
        }

        Err(CommandError::CannotDetermineProject(target.to_string()))
    }

    async fn print_help(&self, project: &str, target: &str) -> Result<(), CommandError> {
        let project = self
            .workspace
            .project(project)
            .ok_or_else(|| CommandError::ProjectNotFound(project.to_string()))?;
        let builder = self
            .binder
            .resolve_builder(project, target)
            .await
            .map_err(|e| self.binder_failure(e))?;
        let schema = self.binder.schema_for(&builder).await?;
        help::print_builder_help(&project.name, target, &builder, &schema);
        Ok(())
    }

    fn binder_failure(&self, error: BinderError) -> CommandError {
        match error {
            BinderError::ModuleNotFound { builder, .. } => {
                error_translator::missing_builder(&builder, &self.workspace.root, self.installs)
            }
            other => other.into(),
        }
    }
}

fn builder_conflict(
    target: &str,
    projects: &[String],
    builders: &std::collections::BTreeSet<BuilderId>,
) -> CommandError {
    CommandError::BuilderConflict {
        target: target.to_string(),
        projects: projects.join(", "),
        builders: builders
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n  "),
    }
}
