// src/system/executor.rs

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::{Child, Command};

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' exited with {}.", describe_status(.status))]
    NonZeroExitStatus { command: String, status: ExitStatus },
    #[error("Command '{0}' was interrupted.")]
    Interrupted(String),
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by a signal)".to_string(),
    }
}

/// Splits a command line with shell quoting rules.
pub fn split_command(command_line: &str) -> Result<Vec<String>, ExecutionError> {
    let parts = shlex::split(command_line.trim())
        .ok_or_else(|| ExecutionError::CommandParse(command_line.to_string()))?;
    if parts.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }
    Ok(parts)
}

/// Renders an argv back into one line for messages.
pub fn display_command(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}

/// Spawns `argv` in `cwd` with inherited stdio.
///
/// On Windows a program that is not found is retried through `cmd /C`, so
/// shell built-ins like `echo` work.
pub fn spawn(
    argv: &[String],
    cwd: &Path,
    env_vars: &HashMap<String, String>,
) -> Result<Child, ExecutionError> {
    let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyCommand)?;
    let clean_cwd = dunce::simplified(cwd);
    let command_line = display_command(argv);

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(clean_cwd)
        .envs(env_vars)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    match command.spawn() {
        Ok(child) => Ok(child),
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("Command '{}' not found. Retrying with cmd /C.", program);
            Command::new("cmd")
                .arg("/C")
                .arg(&command_line)
                .current_dir(clean_cwd)
                .envs(env_vars)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| ExecutionError::CommandFailed(command_line, e))
        }
        Err(e) => Err(ExecutionError::CommandFailed(command_line, e)),
    }
}

/// Waits for `child` to exit. Ctrl+C kills the child and reports an interruption.
pub async fn wait(child: &mut Child, command_line: &str) -> Result<(), ExecutionError> {
    tokio::select! {
        status = child.wait() => {
            let status = status
                .map_err(|e| ExecutionError::CommandFailed(command_line.to_string(), e))?;
            if status.success() {
                Ok(())
            } else {
                Err(ExecutionError::NonZeroExitStatus {
                    command: command_line.to_string(),
                    status,
                })
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::debug!("Ctrl+C received, killing '{}' (PID: {:?})", command_line, child.id());
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill child process {:?}: {}", child.id(), e);
            }
            Err(ExecutionError::Interrupted(command_line.to_string()))
        }
    }
}
