// src/system/runtime.rs

//! Runs builders as local processes.

use crate::{
    constants::{ENV_CONFIGURATION, ENV_PROJECT, ENV_TARGET},
    core::{
        builder::{BuilderRun, BuilderRuntime, RuntimeError},
        schema::validate,
    },
    models::{BuilderSchema, ExecutionResult, OptionMap, RunRequest},
    system::{
        executor,
        registry::{BuilderKind, BuilderRegistry},
    },
};
use async_trait::async_trait;
use colored::*;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Child;

/// Options of `xrun:command` that configure the process instead of becoming flags.
const COMMAND_OWN_OPTIONS: &[&str] = &["command", "args", "cwd"];

#[derive(Debug, Clone)]
pub struct LocalRuntime {
    registry: BuilderRegistry,
}

impl LocalRuntime {
    pub fn new(registry: BuilderRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl BuilderRuntime for LocalRuntime {
    async fn schedule(&self, request: RunRequest) -> Result<Box<dyn BuilderRun>, RuntimeError> {
        let kind = self.registry.kind(&request.builder)?;
        let schema = self.registry.schema(&request.builder)?;

        let violations = validate(&schema, &request.options);
        if !violations.is_empty() {
            return Err(RuntimeError::Validation(violations));
        }

        match kind {
            BuilderKind::Echo => Ok(Box::new(EchoRun::new(request))),
            BuilderKind::Command => {
                let prepared = prepare_command(&request, &schema)?;
                Ok(Box::new(CommandRun::new(prepared, &request)))
            }
            BuilderKind::Declared(declaration) => {
                let mut argv = executor::split_command(&declaration.command)
                    .map_err(|e| preparation(&request, e))?;
                argv.extend(render_options(&schema, &request.options, &[]));
                argv.extend(request.extra_args.iter().cloned());
                let prepared = PreparedCommand {
                    argv,
                    cwd: request.project_root.clone(),
                };
                Ok(Box::new(CommandRun::new(prepared, &request)))
            }
        }
    }
}

fn preparation(request: &RunRequest, reason: impl ToString) -> RuntimeError {
    RuntimeError::Preparation {
        builder: request.builder.to_string(),
        reason: reason.to_string(),
    }
}

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
}

/// Builds the process for an `xrun:command` run: the `command` line, then
/// `args`, then every other option as a flag, then bare extra arguments.
pub fn prepare_command(
    request: &RunRequest,
    schema: &BuilderSchema,
) -> Result<PreparedCommand, RuntimeError> {
    let command = request
        .options
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut argv = executor::split_command(command).map_err(|e| preparation(request, e))?;

    if let Some(Value::Array(args)) = request.options.get("args") {
        argv.extend(args.iter().map(value_to_arg));
    }
    argv.extend(render_options(schema, &request.options, COMMAND_OWN_OPTIONS));
    argv.extend(request.extra_args.iter().cloned());

    let cwd = match request.options.get("cwd").and_then(Value::as_str) {
        Some(raw) => resolve_cwd(&request.project_root, raw).map_err(|e| preparation(request, e))?,
        None => request.project_root.clone(),
    };

    Ok(PreparedCommand { argv, cwd })
}

fn resolve_cwd(project_root: &Path, raw: &str) -> Result<PathBuf, shellexpand::LookupError<std::env::VarError>> {
    let expanded = PathBuf::from(shellexpand::full(raw)?.as_ref());
    Ok(if expanded.is_absolute() {
        expanded
    } else {
        project_root.join(expanded)
    })
}

/// Renders options as command-line arguments.
///
/// Positional options come first in index order. Then every other option in
/// key order: `--name` for `true`, `--name=value` otherwise, one flag per
/// element for arrays. Keys in `skip` and null values are left out.
pub fn render_options(schema: &BuilderSchema, options: &OptionMap, skip: &[&str]) -> Vec<String> {
    let mut positionals: Vec<(usize, &str)> = schema
        .options
        .iter()
        .filter_map(|def| def.positional.map(|index| (index, def.name.as_str())))
        .collect();
    positionals.sort_unstable();

    let mut argv: Vec<String> = positionals
        .iter()
        .filter_map(|(_, name)| options.get(*name))
        .filter(|value| !value.is_null())
        .map(value_to_arg)
        .collect();

    for (name, value) in options {
        if skip.contains(&name.as_str()) || positionals.iter().any(|(_, p)| p == name) {
            continue;
        }
        match value {
            Value::Null => {}
            Value::Bool(true) => argv.push(format!("--{}", name)),
            Value::Array(items) => {
                argv.extend(items.iter().map(|item| format!("--{}={}", name, value_to_arg(item))));
            }
            other => argv.push(format!("--{}={}", name, value_to_arg(other))),
        }
    }
    argv
}

fn value_to_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn run_env(request: &RunRequest) -> HashMap<String, String> {
    HashMap::from([
        (ENV_PROJECT.to_string(), request.project.clone()),
        (ENV_TARGET.to_string(), request.target.clone()),
        (ENV_CONFIGURATION.to_string(), request.configuration.clone()),
    ])
}

/// A process-backed run. The child is only spawned once `result` is awaited.
struct CommandRun {
    prepared: PreparedCommand,
    env: HashMap<String, String>,
    child: Option<Child>,
}

impl CommandRun {
    fn new(prepared: PreparedCommand, request: &RunRequest) -> Self {
        Self {
            prepared,
            env: run_env(request),
            child: None,
        }
    }
}

#[async_trait]
impl BuilderRun for CommandRun {
    async fn result(&mut self) -> ExecutionResult {
        let command_line = executor::display_command(&self.prepared.argv);
        log::debug!(
            "Running '{}' in '{}'",
            command_line,
            self.prepared.cwd.display()
        );

        let child = match executor::spawn(&self.prepared.argv, &self.prepared.cwd, &self.env) {
            Ok(child) => self.child.insert(child),
            Err(e) => return ExecutionResult::failed(e.to_string()),
        };
        let outcome = executor::wait(child, &command_line).await;
        self.child = None;

        match outcome {
            Ok(()) => ExecutionResult::succeeded(),
            Err(e) => ExecutionResult::failed(e.to_string()),
        }
    }

    async fn dispose(&mut self) {
        if let Some(mut child) = self.child.take() {
            log::debug!("Disposing of still-running child {:?}", child.id());
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill child process {:?}: {}", child.id(), e);
            }
        }
    }
}

/// Prints what `xrun:echo` was asked to print.
struct EchoRun {
    request: RunRequest,
}

impl EchoRun {
    fn new(request: RunRequest) -> Self {
        Self { request }
    }
}

#[async_trait]
impl BuilderRun for EchoRun {
    async fn result(&mut self) -> ExecutionResult {
        let options = &self.request.options;
        if let Some(message) = options.get("message").and_then(Value::as_str) {
            println!("{}", message);
        }

        if options.get("json").and_then(Value::as_bool).unwrap_or(false) {
            match serde_json::to_string_pretty(options) {
                Ok(json) => println!("{}", json),
                Err(e) => return ExecutionResult::failed(e.to_string()),
            }
        } else {
            println!(
                "{} {}",
                format!("{}:{}", self.request.project, self.request.target).cyan(),
                self.request.builder.to_string().dimmed()
            );
            for (name, value) in options {
                println!("  {} = {}", name.green(), value);
            }
        }
        ExecutionResult::succeeded()
    }

    async fn dispose(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::schema::ViolationKeyword,
        models::{BuilderDeclaration, BuilderId, OptionDefinition, OptionType, Workspace},
    };
    use serde_json::json;

    fn request(builder: &str, options: Value) -> RunRequest {
        RunRequest {
            project: "app".to_string(),
            project_root: PathBuf::from("/ws/app"),
            target: "build".to_string(),
            configuration: String::new(),
            builder: BuilderId::parse(builder).unwrap(),
            options: options.as_object().cloned().unwrap_or_default(),
            extra_args: Vec::new(),
        }
    }

    fn runtime() -> LocalRuntime {
        let mut workspace = Workspace::default();
        workspace.builders.insert(
            "cargo".to_string(),
            [(
                "test".to_string(),
                BuilderDeclaration {
                    command: "cargo test".to_string(),
                    options: vec![OptionDefinition {
                        name: "release".to_string(),
                        kind: OptionType::Boolean,
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            )]
            .into(),
        );
        LocalRuntime::new(BuilderRegistry::new(&workspace))
    }

    #[test]
    fn test_render_options_puts_positionals_first() {
        let schema = BuilderSchema {
            options: vec![OptionDefinition {
                name: "entry".to_string(),
                positional: Some(0),
                ..Default::default()
            }],
            ..Default::default()
        };
        let options = json!({
            "watch": true,
            "verbose": false,
            "entry": "main.rs",
            "include": ["a", "b"],
            "port": 4200,
            "skip": null
        });
        let argv = render_options(&schema, options.as_object().unwrap(), &[]);
        assert_eq!(
            argv,
            vec![
                "main.rs",
                "--include=a",
                "--include=b",
                "--port=4200",
                "--verbose=false",
                "--watch"
            ]
        );
    }

    #[test]
    fn test_prepare_command_composes_argv_and_cwd() {
        let mut req = request(
            "xrun:command",
            json!({ "command": "cargo build", "args": ["--locked"], "release": true, "cwd": "sub" }),
        );
        req.extra_args = vec!["--".to_string(), "x".to_string()];
        let schema = runtime().registry.schema(&req.builder).unwrap();

        let prepared = prepare_command(&req, &schema).unwrap();
        assert_eq!(
            prepared.argv,
            vec!["cargo", "build", "--locked", "--release", "--", "x"]
        );
        assert_eq!(prepared.cwd, PathBuf::from("/ws/app/sub"));
    }

    #[tokio::test]
    async fn test_schedule_rejects_invalid_options() {
        let runtime = runtime();
        let result = runtime
            .schedule(request("cargo:test", json!({ "release": "yes", "foo": 1 })))
            .await;
        let Err(RuntimeError::Validation(violations)) = result else {
            unreachable!("expected a validation failure");
        };
        let keywords: Vec<ViolationKeyword> = violations.iter().map(|v| v.keyword).collect();
        assert!(keywords.contains(&ViolationKeyword::AdditionalProperties));
        assert!(keywords.contains(&ViolationKeyword::Type));
    }

    #[tokio::test]
    async fn test_schedule_reports_unparseable_command() {
        let result = runtime()
            .schedule(request("xrun:command", json!({ "command": "echo 'open" })))
            .await;
        assert!(matches!(result, Err(RuntimeError::Preparation { .. })));
    }

    #[tokio::test]
    async fn test_echo_run_succeeds() {
        let mut run = runtime()
            .schedule(request("xrun:echo", json!({ "message": "hello" })))
            .await
            .unwrap();
        assert!(run.result().await.success);
        run.dispose().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_run_reports_process_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime();

        let mut ok = request("xrun:command", json!({ "command": "true" }));
        ok.project_root = dir.path().to_path_buf();
        let mut run = runtime.schedule(ok).await.unwrap();
        assert_eq!(run.result().await, ExecutionResult::succeeded());
        run.dispose().await;

        let mut failing = request("xrun:command", json!({ "command": "sh -c 'exit 3'" }));
        failing.project_root = dir.path().to_path_buf();
        let mut run = runtime.schedule(failing).await.unwrap();
        let result = run.result().await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("code 3"));
        run.dispose().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_run_exports_the_run_to_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(
            "xrun:command",
            json!({
                "command": "sh",
                "args": ["-c", r#"printf '%s %s %s' "$XRUN_PROJECT" "$XRUN_TARGET" "$XRUN_CONFIGURATION" > out"#]
            }),
        );
        req.project_root = dir.path().to_path_buf();
        req.configuration = "production".to_string();

        let mut run = runtime().schedule(req).await.unwrap();
        assert!(run.result().await.success);
        run.dispose().await;

        let exported = std::fs::read_to_string(dir.path().join("out")).unwrap();
        assert_eq!(exported, "app build production");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dispose_kills_an_unfinished_child() {
        let dir = tempfile::tempdir().unwrap();
        let argv: Vec<String> = ["sh", "-c", "sleep 1 && touch finished"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut run = CommandRun::new(
            PreparedCommand {
                argv,
                cwd: dir.path().to_path_buf(),
            },
            &request("xrun:command", json!({})),
        );

        // Start the process, then abandon the run before it exits.
        tokio::select! {
            biased;
            _ = run.result() => unreachable!("the child sleeps before exiting"),
            _ = std::future::ready(()) => {}
        }
        assert!(run.child.is_some());

        run.dispose().await;
        assert!(run.child.is_none());

        std::thread::sleep(std::time::Duration::from_millis(1500));
        assert!(!dir.path().join("finished").exists());
    }
}
