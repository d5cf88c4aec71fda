// src/core/specifier.rs

use crate::{constants::SPECIFIER_SEPARATOR, models::CommandOptions};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecifierError {
    #[error("A target name is required, e.g. 'xrun run app:build'.")]
    MissingTarget,
    #[error("Invalid target specifier '{0}'. Expected 'project:target[:configuration]'.")]
    Malformed(String),
}

/// The normalized `(project, target, configuration)` triple of an invocation.
///
/// An empty `project` means "not resolved yet" and an empty `configuration`
/// means "use the target's default". Neither is ever absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSpecifier {
    pub project: String,
    pub target: String,
    pub configuration: String,
}

impl TargetSpecifier {
    /// Builds the triple from the raw command options.
    ///
    /// - A `target` option in `project:target[:configuration]` form is split;
    ///   a discrete `configuration` option wins over the embedded segment.
    /// - Otherwise `project` and `configuration` come from the discrete options
    ///   and the target is the command's fixed target (or the bare `target` option).
    /// - `prod` selects `production` when no configuration was given at all.
    pub fn from_options(
        fixed_target: Option<&str>,
        options: &CommandOptions,
    ) -> Result<Self, SpecifierError> {
        let mut specifier = match options.target.as_deref() {
            Some(raw) if raw.contains(SPECIFIER_SEPARATOR) => Self::parse_compact(raw)?,
            raw => {
                let target = fixed_target
                    .or(raw)
                    .filter(|t| !t.is_empty())
                    .ok_or(SpecifierError::MissingTarget)?;
                Self {
                    project: options.project.clone().unwrap_or_default(),
                    target: target.to_string(),
                    configuration: String::new(),
                }
            }
        };

        if let Some(configuration) = &options.configuration {
            specifier.configuration = configuration.clone();
        }
        if specifier.configuration.is_empty() && options.prod {
            specifier.configuration = "production".to_string();
        }

        log::debug!("Target specifier resolved to '{}'", specifier);
        Ok(specifier)
    }

    /// Parses `project:target[:configuration]`. Both project and target must be present.
    fn parse_compact(raw: &str) -> Result<Self, SpecifierError> {
        let mut segments = raw.split(SPECIFIER_SEPARATOR);
        let project = segments.next().unwrap_or_default();
        let target = segments.next().unwrap_or_default();
        let configuration = segments.next().unwrap_or_default();

        if project.is_empty() || target.is_empty() || segments.next().is_some() {
            return Err(SpecifierError::Malformed(raw.to_string()));
        }

        Ok(Self {
            project: project.to_string(),
            target: target.to_string(),
            configuration: configuration.to_string(),
        })
    }

    pub fn has_project(&self) -> bool {
        !self.project.is_empty()
    }

    /// Returns a copy of this specifier bound to `project`.
    pub fn with_project(&self, project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for TargetSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.project, SPECIFIER_SEPARATOR, self.target)?;
        if !self.configuration.is_empty() {
            write!(f, "{}{}", SPECIFIER_SEPARATOR, self.configuration)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(target: Option<&str>) -> CommandOptions {
        CommandOptions {
            target: target.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_compact_specifier_with_discrete_configuration_override() {
        let mut opts = options(Some("app:build:production"));
        opts.configuration = Some("staging".to_string());

        let specifier = TargetSpecifier::from_options(None, &opts).unwrap();
        assert_eq!(
            specifier,
            TargetSpecifier {
                project: "app".to_string(),
                target: "build".to_string(),
                configuration: "staging".to_string(),
            }
        );
    }

    #[test]
    fn test_compact_specifier_keeps_embedded_configuration() {
        let specifier = TargetSpecifier::from_options(None, &options(Some("app:build:production")))
            .unwrap();
        assert_eq!(specifier.configuration, "production");
        assert_eq!(specifier.to_string(), "app:build:production");
    }

    #[test]
    fn test_fixed_target_normalizes_missing_values_to_empty() {
        let specifier = TargetSpecifier::from_options(Some("test"), &options(None)).unwrap();
        assert_eq!(specifier.target, "test");
        assert_eq!(specifier.project, "");
        assert_eq!(specifier.configuration, "");
        assert!(!specifier.has_project());
    }

    #[test]
    fn test_discrete_project_and_configuration() {
        let opts = CommandOptions {
            project: Some("lib".to_string()),
            configuration: Some("ci".to_string()),
            ..Default::default()
        };
        let specifier = TargetSpecifier::from_options(Some("lint"), &opts).unwrap();
        assert_eq!(specifier.project, "lib");
        assert_eq!(specifier.target, "lint");
        assert_eq!(specifier.configuration, "ci");
    }

    #[test]
    fn test_prod_flag_only_applies_without_configuration() {
        let mut opts = options(None);
        opts.prod = true;
        let specifier = TargetSpecifier::from_options(Some("build"), &opts).unwrap();
        assert_eq!(specifier.configuration, "production");

        opts.configuration = Some("staging".to_string());
        let specifier = TargetSpecifier::from_options(Some("build"), &opts).unwrap();
        assert_eq!(specifier.configuration, "staging");
    }

    #[test]
    fn test_bare_target_option_without_fixed_target() {
        let specifier = TargetSpecifier::from_options(None, &options(Some("deploy"))).unwrap();
        assert_eq!(specifier.target, "deploy");
        assert!(!specifier.has_project());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            TargetSpecifier::from_options(None, &options(None)),
            Err(SpecifierError::MissingTarget)
        );
        assert!(matches!(
            TargetSpecifier::from_options(None, &options(Some(":build"))),
            Err(SpecifierError::Malformed(_))
        ));
        assert!(matches!(
            TargetSpecifier::from_options(None, &options(Some("a:b:c:d"))),
            Err(SpecifierError::Malformed(_))
        ));
    }
}
