// src/cli/handlers/run.rs

use anyhow::{Result, anyhow};

use crate::{cli::handlers::target::parse_command_options, core::target_runner::TargetRunner};

/// Handles `xrun run <project:target[:configuration]> [flags] [overrides...]`.
///
/// A bare target name is accepted too and resolved like a fixed-target command.
pub async fn handle(runner: &TargetRunner<'_>, args: Vec<String>) -> Result<i32> {
    let mut args = args.into_iter();
    let specifier = args
        .next()
        .filter(|first| !first.starts_with('-'))
        .ok_or_else(|| anyhow!(t!("run.error.specifier_required")))?;

    let rest: Vec<String> = args.collect();
    let options = parse_command_options(Some(specifier), &rest)?;
    Ok(runner.run_target(None, false, options).await)
}
