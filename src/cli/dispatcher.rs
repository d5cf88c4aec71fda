// src/cli/dispatcher.rs

use anyhow::{Context, Result, anyhow};
use clap::CommandFactory;

use crate::{
    cli::{Cli, handlers},
    constants::EXIT_SUCCESS,
    core::target_runner::{DefaultHooks, TargetRunner},
    system::{
        install_check::FsInstallationChecker, registry::BuilderRegistry, runtime::LocalRuntime,
        workspace_loader,
    },
};

// --- Command Definition and Registry ---

/// What a command does once it is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Runs a fixed target through the resolution engine.
    Target {
        target: &'static str,
        multi_target: bool,
    },
    /// Runs whatever `project:target[:configuration]` names.
    Run,
    List,
}

/// Defines a command and its aliases.
#[derive(Debug)]
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    action: Action,
}

const fn target(target: &'static str, multi_target: bool) -> Action {
    Action::Target {
        target,
        multi_target,
    }
}

/// The single source of truth for all commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "build",
        aliases: &["b"],
        action: target("build", false),
    },
    CommandDefinition {
        name: "serve",
        aliases: &["s"],
        action: target("serve", false),
    },
    CommandDefinition {
        name: "test",
        aliases: &["t"],
        action: target("test", true),
    },
    CommandDefinition {
        name: "lint",
        aliases: &["l"],
        action: target("lint", true),
    },
    CommandDefinition {
        name: "e2e",
        aliases: &["e"],
        action: target("e2e", true),
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        action: Action::Run,
    },
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        action: Action::List,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Loads the workspace, wires the engine to the local builders and runs the command.
/// Returns the process exit code.
pub async fn dispatch(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    let mut args = cli.args.into_iter();
    let Some(name) = args.next() else {
        Cli::command().print_help()?;
        return Ok(EXIT_SUCCESS);
    };
    let command = find_command(&name)
        .ok_or_else(|| anyhow!(t!("error.unknown_command"), command = name))?;
    let args: Vec<String> = args.collect();

    let workspace = workspace_loader::discover(cli.workspace.as_deref())
        .context(t!("error.workspace_load_failed"))?;
    let registry = BuilderRegistry::new(&workspace);
    let runtime = LocalRuntime::new(registry.clone());
    let installs = FsInstallationChecker;
    let runner = TargetRunner::new(&workspace, &registry, &runtime, &installs, &DefaultHooks);

    match command.action {
        Action::Target {
            target,
            multi_target,
        } => handlers::target::handle(&runner, target, multi_target, args).await,
        Action::Run => handlers::run::handle(&runner, args).await,
        Action::List => handlers::list::handle(&workspace, &registry, args),
    }
}
