// src/core/help.rs

use crate::{
    constants::COMMAND_FLAG_NAMES,
    models::{BuilderId, BuilderSchema, OptionDefinition, OptionType},
};
use colored::*;

/// Prints the options `builder` accepts when running `target` on `project`.
pub fn print_builder_help(project: &str, target: &str, builder: &BuilderId, schema: &BuilderSchema) {
    println!(
        "{}",
        format!(
            t!("help.header"),
            target = target.cyan().bold(),
            project = project.cyan(),
            builder = builder.to_string().yellow()
        )
    );
    if let Some(description) = &schema.description {
        println!("  {}", description.dimmed());
    }

    println!("\n{}", t!("help.options").bold());
    if schema.options.is_empty() {
        println!("  {}", t!("help.no_options").dimmed());
    }
    for def in &schema.options {
        println!("  {:<32} {}", usage(def).green(), details(def));
    }
    let shadowed = shadowed_flags(schema);
    if !shadowed.is_empty() {
        println!(
            "\n  {}",
            format!(t!("help.shadowed_flags"), flags = shadowed.join(", ")).yellow()
        );
    }
    if schema.additional_properties {
        println!("\n  {}", t!("help.additional_properties").dimmed());
    }
}

/// Printed for a help request that does not resolve to a single project.
pub fn print_candidates(target: &str, candidates: &[String]) {
    println!("{}", format!(t!("help.candidates"), target = target.cyan().bold()));
    for name in candidates {
        println!("  {} {}", "•".blue(), name);
    }
    println!("\n{}", t!("help.pick_project").dimmed());
}

/// Option spellings the command keeps for itself, e.g. `-p` or `--help`.
fn shadowed_flags(schema: &BuilderSchema) -> Vec<String> {
    schema
        .options
        .iter()
        .filter(|def| def.positional.is_none())
        .flat_map(|def| std::iter::once(&def.name).chain(&def.aliases))
        .filter(|name| COMMAND_FLAG_NAMES.contains(&name.as_str()))
        .map(|name| {
            let dashes = if name.chars().count() == 1 { "-" } else { "--" };
            format!("{}{}", dashes, name)
        })
        .collect()
}

fn usage(def: &OptionDefinition) -> String {
    let mut usage = match def.positional {
        Some(index) => format!("<{}> (#{})", def.name, index),
        None => format!("--{}", def.name),
    };
    for alias in &def.aliases {
        let dashes = if alias.chars().count() == 1 { "-" } else { "--" };
        usage.push_str(&format!(", {}{}", dashes, alias));
    }
    if def.positional.is_none() && def.kind != OptionType::Boolean {
        usage.push_str(&format!(" <{}>", def.kind));
    }
    usage
}

fn details(def: &OptionDefinition) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(description) = &def.description {
        parts.push(description.clone());
    }
    if !def.enum_values.is_empty() {
        parts.push(format!("[{}]", def.enum_values.join("|")));
    }
    if let Some(default) = &def.default {
        parts.push(format!("(default: {})", default).dimmed().to_string());
    }
    if def.required {
        parts.push("(required)".red().to_string());
    }
    parts.join(" ")
}
