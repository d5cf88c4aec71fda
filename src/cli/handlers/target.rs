// src/cli/handlers/target.rs

use anyhow::Result;
use clap::{ArgAction, Parser};

use crate::{core::target_runner::TargetRunner, models::CommandOptions};

/// Command flags that take a value, as `(short, long)`.
const VALUE_FLAGS: &[(&str, &str)] = &[("-p", "--project"), ("-c", "--configuration")];
/// Command flags without a value.
const SWITCHES: &[&str] = &["--prod", "-h", "--help"];

// --- Command Argument Parsing ---
#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, disable_help_flag = true)]
pub struct TargetArgs {
    /// Project to run the target on.
    #[arg(short, long)]
    pub project: Option<String>,
    /// Configuration(s) to apply, comma-separated.
    #[arg(short, long)]
    pub configuration: Option<String>,
    /// Shorthand for `--configuration=production`.
    #[arg(long)]
    pub prod: bool,
    /// Show the options of the resolved builder.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub help: bool,
}

/// Separates the command's own flags from everything meant for the builder.
///
/// Command flags are recognised anywhere before a literal `--`. All other
/// tokens, including a project name typed in place, stay in order as overrides.
pub fn split_command_flags(args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut flags = Vec::new();
    let mut overrides = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            overrides.push(arg.clone());
            overrides.extend(iter.by_ref().cloned());
            break;
        }

        let (name, inline) = match arg.split_once('=') {
            Some((name, _)) => (name, true),
            None => (arg.as_str(), false),
        };

        if VALUE_FLAGS.iter().any(|(short, long)| name == *short || name == *long) {
            flags.push(arg.clone());
            if !inline && let Some(value) = iter.next() {
                flags.push(value.clone());
            }
        } else if SWITCHES.contains(&arg.as_str()) {
            flags.push(arg.clone());
        } else {
            overrides.push(arg.clone());
        }
    }

    (flags, overrides)
}

/// Parses the arguments of a target command into [`CommandOptions`].
pub fn parse_command_options(target: Option<String>, args: &[String]) -> Result<CommandOptions> {
    let (flags, overrides) = split_command_flags(args);
    let parsed = TargetArgs::try_parse_from(&flags)?;
    log::debug!("Command flags: {:?}, overrides: {:?}", parsed, overrides);

    Ok(CommandOptions {
        target,
        project: parsed.project,
        configuration: parsed.configuration,
        prod: parsed.prod,
        help: parsed.help,
        overrides,
    })
}

// --- Main Handler ---
/// Handles `build`, `serve`, `test` and the other fixed-target commands.
pub async fn handle(
    runner: &TargetRunner<'_>,
    target: &str,
    multi_target: bool,
    args: Vec<String>,
) -> Result<i32> {
    let options = parse_command_options(None, &args)?;
    Ok(runner.run_target(Some(target), multi_target, options).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_project_token_stays_with_overrides() {
        let options = parse_command_options(None, &args(&["lib", "--watch=false"])).unwrap();
        assert_eq!(options.project, None);
        assert_eq!(options.overrides, args(&["lib", "--watch=false"]));
    }

    #[test]
    fn test_command_flags_are_extracted_anywhere() {
        let options = parse_command_options(
            None,
            &args(&["--watch", "-p", "app", "--configuration=staging", "--prod", "x", "--help"]),
        )
        .unwrap();
        assert_eq!(options.project.as_deref(), Some("app"));
        assert_eq!(options.configuration.as_deref(), Some("staging"));
        assert!(options.prod);
        assert!(options.help);
        assert_eq!(options.overrides, args(&["--watch", "x"]));
    }

    #[test]
    fn test_tokens_after_double_dash_are_never_command_flags() {
        let options = parse_command_options(None, &args(&["--", "-p", "app"])).unwrap();
        assert_eq!(options.project, None);
        assert_eq!(options.overrides, args(&["--", "-p", "app"]));
    }

    #[test]
    fn test_missing_flag_value_is_an_error() {
        assert!(parse_command_options(None, &args(&["--project"])).is_err());
    }
}
