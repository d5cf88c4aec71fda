// src/cli/handlers/list.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{
    core::project_index::ProjectTargetIndex,
    models::Workspace,
    system::registry::BuilderRegistry,
};

// --- Command Argument Parsing ---
#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists the projects of the workspace and their targets.")]
struct ListArgs {
    /// Also list every builder the workspace can use.
    #[arg(short, long)]
    builders: bool,
}

// --- Main Handler ---
pub fn handle(workspace: &Workspace, registry: &BuilderRegistry, args: Vec<String>) -> Result<i32> {
    let list_args = ListArgs::try_parse_from(&args)?;
    let default_project = ProjectTargetIndex::new(workspace).default_project();

    println!(
        "{}",
        format!(t!("list.info.header"), root = workspace.root.display()).bold()
    );
    if workspace.projects.is_empty() {
        println!("  {}", t!("list.info.no_projects").dimmed());
    }

    for project in &workspace.projects {
        let marker = if project.name == default_project {
            format!(" {}", t!("list.info.default_marker")).yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "\n  {}{} {}",
            project.name.cyan().bold(),
            marker,
            project.root.display().to_string().dimmed()
        );
        for (target, definition) in &project.targets {
            println!("    {} {:<16} {}", "•".blue(), target, definition.builder.dimmed());
        }
    }

    if list_args.builders {
        println!("\n{}", t!("list.info.builders_header").bold());
        for builder in registry.builder_ids() {
            println!("  {} {}", "•".blue(), builder.to_string().green());
        }
    }

    Ok(crate::constants::EXIT_SUCCESS)
}
