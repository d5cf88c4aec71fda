// src/core/disambiguation.rs

//! Infers which project an invocation meant when it did not name one.
//!
//! When several projects expose the target and the user passed trailing
//! tokens, one of those tokens may be a project name (`xrun test lib --watch`).
//! Each candidate's builder parses the tokens with its own option schema; a
//! project name that stays unconsumed under *every* candidate's parse is a
//! selector the user typed literally. If exactly one such name survives, it is
//! the resolved project and one occurrence of it is stripped from the tokens,
//! but only an occurrence whose removal leaves the parsed options unchanged.

use crate::{
    core::{
        builder::{BinderError, OptionSchemaBinder},
        override_parser::parse_arguments,
    },
    models::{BuilderId, OptionDefinition, OptionMap, Workspace},
};
use std::collections::{BTreeSet, HashMap};

/// The outcome of inspecting the override tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disambiguation {
    /// The project named by the tokens, if exactly one candidate survived.
    pub project: Option<String>,
    /// Tokens to pass onward. The selector token is removed when that is safe.
    pub overrides: Vec<String>,
    /// Distinct builders used by the candidates.
    pub builders: BTreeSet<BuilderId>,
}

/// Narrows `candidates` to the projects named by a leftover token under every parse.
///
/// Each parse contributes the set of candidate names among its leftovers and
/// the result is the intersection of all of them, so the order in which the
/// parses are given does not matter.
pub fn narrow_candidates(candidates: &[String], leftovers: &[Vec<String>]) -> BTreeSet<String> {
    let names: BTreeSet<&str> = candidates.iter().map(String::as_str).collect();

    leftovers.iter().fold(
        candidates.iter().cloned().collect(),
        |remaining: BTreeSet<String>, tokens| {
            let mentioned: BTreeSet<&str> = tokens
                .iter()
                .map(String::as_str)
                .filter(|t| names.contains(t))
                .collect();
            remaining
                .into_iter()
                .filter(|p| mentioned.contains(p.as_str()))
                .collect()
        },
    )
}

/// Finds the occurrence of `project` in `tokens` that can be removed without
/// changing how the remaining tokens parse.
///
/// Occurrences are tried left to right; the first one whose removal yields the
/// same structured options as `baseline` wins. `None` means no occurrence is
/// safe to remove and the tokens must be passed on untouched.
pub fn find_selector_token(
    tokens: &[String],
    project: &str,
    definitions: &[OptionDefinition],
    baseline: &OptionMap,
) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| *token == project)
        .map(|(position, _)| position)
        .find(|&position| {
            let mut trial = tokens.to_vec();
            trial.remove(position);
            let reparsed = parse_arguments(&trial, definitions);
            log::trace!(
                "Removing '{}' at {} parses to {:?}",
                project,
                position,
                reparsed.options
            );
            reparsed.options == *baseline
        })
}

/// Runs the narrow-then-verify disambiguation over `candidates`.
///
/// Builder resolution failures abort immediately; a missing builder package
/// blocks every candidate alike.
pub async fn disambiguate(
    workspace: &Workspace,
    binder: &dyn OptionSchemaBinder,
    target: &str,
    candidates: &[String],
    overrides: &[String],
) -> Result<Disambiguation, BinderError> {
    let mut builders = BTreeSet::new();
    let mut parses: HashMap<&str, (Vec<OptionDefinition>, OptionMap)> = HashMap::new();
    let mut leftovers: Vec<Vec<String>> = Vec::with_capacity(candidates.len());

    for name in candidates {
        let Some(project) = workspace.project(name) else {
            continue;
        };
        let builder = binder.resolve_builder(project, target).await?;
        let schema = binder.schema_for(&builder).await?;
        let parsed = parse_arguments(overrides, &schema.options);

        log::debug!(
            "Candidate '{}' ({}) leaves {:?} unconsumed",
            name,
            builder,
            parsed.leftovers
        );

        leftovers.push(parsed.leftovers);
        parses.insert(name.as_str(), (schema.options, parsed.options));
        builders.insert(builder);
    }

    let narrowed = narrow_candidates(candidates, &leftovers);
    log::debug!("Candidates named by the overrides: {:?}", narrowed);

    let mut result = Disambiguation {
        project: None,
        overrides: overrides.to_vec(),
        builders,
    };

    let mut narrowed = narrowed.into_iter();
    if let (Some(project), None) = (narrowed.next(), narrowed.next()) {
        if let Some((definitions, baseline)) = parses.get(project.as_str()) {
            match find_selector_token(overrides, &project, definitions, baseline) {
                Some(position) => {
                    log::debug!("Stripping project selector '{}' at {}", project, position);
                    result.overrides.remove(position);
                }
                None => log::debug!(
                    "No occurrence of '{}' can be removed safely; keeping overrides as-is",
                    project
                ),
            }
        }
        result.project = Some(project);
    }

    Ok(result)
}
