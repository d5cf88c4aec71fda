// src/core/error_translator.rs

use crate::{
    constants::DEPENDENCY_MARKERS,
    core::{
        builder::InstallationChecker,
        errors::CommandError,
        schema::{SchemaViolation, ViolationKeyword},
    },
    models::OptionMap,
};
use std::path::Path;

/// Derives the flag a user typed from a leftover token: `--foo=1` -> `--foo`, `x` -> `-x`.
pub fn flag_form(token: &str) -> String {
    let name = token.trim_start_matches('-');
    let name = name.split_once('=').map_or(name, |(n, _)| n);
    if name.chars().count() == 1 {
        format!("-{}", name)
    } else {
        format!("--{}", name)
    }
}

pub fn unknown_option_message(flag: &str) -> String {
    format!(t!("error.unknown_option"), flag = flag)
}

/// Turns leftover tokens a schema refused into one "Unknown option" line each.
pub fn unknown_options(leftovers: &[String]) -> CommandError {
    let mut lines: Vec<String> = Vec::with_capacity(leftovers.len());
    for token in leftovers {
        let line = unknown_option_message(&flag_form(token));
        if !lines.contains(&line) {
            lines.push(line);
        }
    }
    CommandError::UnknownOptions(lines)
}

/// Converts schema violations into user-facing messages.
///
/// An `additionalProperties` violation about a key the user passed on the
/// command line becomes an "Unknown option" line (once per key). Every other
/// violation is reported as-is.
pub fn translate_violations(
    violations: Vec<SchemaViolation>,
    command_options: &OptionMap,
) -> CommandError {
    let mut unknown: Vec<String> = Vec::new();
    let mut remaining: Vec<String> = Vec::new();

    for violation in violations {
        if violation.keyword == ViolationKeyword::AdditionalProperties
            && command_options.contains_key(&violation.property)
        {
            let line = unknown_option_message(&flag_form(&violation.property));
            if !unknown.contains(&line) {
                unknown.push(line);
            }
        } else {
            remaining.push(violation.to_string());
        }
    }

    unknown.extend(remaining);
    CommandError::InvalidOptions(unknown)
}

/// Builds the fatal error for a builder whose package could not be found,
/// with a hint when the workspace looks like it was never installed.
pub fn missing_builder(
    builder: &str,
    workspace_root: &Path,
    installs: &dyn InstallationChecker,
) -> CommandError {
    let hint = (!installs.has_installed_dependencies(workspace_root)).then(|| {
        format!(
            t!("error.dependencies_not_installed"),
            markers = DEPENDENCY_MARKERS.join(", ")
        )
    });
    CommandError::MissingBuilder {
        builder: builder.to_string(),
        hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Installed(bool);

    impl InstallationChecker for Installed {
        fn has_installed_dependencies(&self, _base_path: &Path) -> bool {
            self.0
        }
    }

    fn violation(keyword: ViolationKeyword, property: &str) -> SchemaViolation {
        SchemaViolation {
            keyword,
            data_path: format!(".{}", property),
            property: property.to_string(),
            message: "is wrong".to_string(),
        }
    }

    #[test]
    fn test_flag_form() {
        assert_eq!(flag_form("--foo=1"), "--foo");
        assert_eq!(flag_form("-x"), "-x");
        assert_eq!(flag_form("--x"), "-x");
        assert_eq!(flag_form("foo"), "--foo");
    }

    #[test]
    fn test_unknown_options_are_deduplicated() {
        let error = unknown_options(&["--foo=1".to_string(), "--foo".to_string(), "-b".to_string()]);
        assert_eq!(
            error.messages(),
            vec!["Unknown option: '--foo'", "Unknown option: '-b'"]
        );
    }

    #[test]
    fn test_translate_rewrites_only_command_line_additional_properties() {
        let mut command_options = OptionMap::new();
        command_options.insert("foo".to_string(), json!(1));

        let error = translate_violations(
            vec![
                violation(ViolationKeyword::AdditionalProperties, "foo"),
                violation(ViolationKeyword::AdditionalProperties, "foo"),
                violation(ViolationKeyword::AdditionalProperties, "fromWorkspace"),
                violation(ViolationKeyword::Type, "watch"),
            ],
            &command_options,
        );

        let messages = error.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], "Unknown option: '--foo'");
        assert_eq!(messages[1], "Data path \".fromWorkspace\" is wrong.");
        assert_eq!(messages[2], "Data path \".watch\" is wrong.");
    }

    #[test]
    fn test_missing_builder_hint_depends_on_install_state() {
        let error = missing_builder("cargo:test", Path::new("."), &Installed(false));
        assert_eq!(error.messages().len(), 2);

        let error = missing_builder("cargo:test", Path::new("."), &Installed(true));
        assert_eq!(
            error.messages(),
            vec!["Could not find the 'cargo:test' builder's package."]
        );
    }
}
