// src/models.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::constants::BUILDER_ID_SEPARATOR;

/// Structured option values keyed by option name.
/// Backed by a sorted map so two parses can be compared for equality.
pub type OptionMap = Map<String, Value>;

// --- WORKSPACE MODELS ---

/// A loaded workspace: projects in file order plus everything else the file declared.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    /// Directory holding the workspace file. Project roots are relative to it.
    pub root: PathBuf,
    /// Projects in the order the workspace file declares them.
    pub projects: Vec<Project>,
    /// Builders declared by the workspace, keyed by package then builder name.
    pub builders: BTreeMap<String, BTreeMap<String, BuilderDeclaration>>,
    /// Top-level keys this engine does not interpret (`default_project` lives here).
    pub extensions: toml::Table,
}

impl Workspace {
    /// Looks up a project by name.
    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Returns the workspace extension value for `key`, accepting the camelCase spelling too.
    pub fn extension(&self, key: &str) -> Option<&toml::Value> {
        self.extensions
            .get(key)
            .or_else(|| self.extensions.get(&snake_to_camel(key)))
    }
}

/// A named project of the workspace.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub name: String,
    /// Root of the project, relative to the workspace root.
    pub root: PathBuf,
    pub targets: BTreeMap<String, TargetDefinition>,
}

impl Project {
    pub fn has_target(&self, target: &str) -> bool {
        self.targets.contains_key(target)
    }
}

/// A builder-backed operation a project exposes (`build`, `test`, ...).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TargetDefinition {
    /// Builder id in `package:name` form.
    pub builder: String,
    #[serde(default)]
    pub options: OptionMap,
    #[serde(default)]
    pub configurations: BTreeMap<String, OptionMap>,
    /// Configuration applied when the invocation does not name one.
    #[serde(default)]
    pub default_configuration: Option<String>,
}

/// A builder declared in the workspace file under `[builders.<package>.<name>]`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BuilderDeclaration {
    /// Base command line; rendered options are appended to it.
    pub command: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub additional_properties: bool,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

// --- BUILDER & SCHEMA MODELS ---

/// Identifies a builder as `package:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuilderId {
    pub package: String,
    pub name: String,
}

impl BuilderId {
    /// Splits a `package:name` string. Returns `None` if either half is missing.
    pub fn parse(raw: &str) -> Option<Self> {
        let (package, name) = raw.split_once(BUILDER_ID_SEPARATOR)?;
        if package.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            package: package.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for BuilderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.package, BUILDER_ID_SEPARATOR, self.name)
    }
}

/// The value type an option accepts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    String,
    Boolean,
    Number,
    Integer,
    /// A repeatable option collecting strings.
    Array,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// One option a builder declares.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OptionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: OptionType,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Index among the bare tokens this option binds to, if it is positional.
    #[serde(default)]
    pub positional: Option<usize>,
    /// Accepted values for a string option. Empty means unrestricted.
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

/// The resolved option schema of a builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuilderSchema {
    pub description: Option<String>,
    pub options: Vec<OptionDefinition>,
    /// Whether options the schema does not declare are accepted.
    pub additional_properties: bool,
}

// --- INVOCATION MODELS ---

/// The raw options of one command invocation, before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// A target name or a compact `project:target[:configuration]` specifier.
    pub target: Option<String>,
    pub project: Option<String>,
    pub configuration: Option<String>,
    /// Shorthand for the `production` configuration.
    pub prod: bool,
    pub help: bool,
    /// Trailing tokens that may hold builder options and, possibly, a project name.
    pub overrides: Vec<String>,
}

/// The outcome of parsing tokens against a builder's option definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOverrides {
    pub options: OptionMap,
    /// Tokens that did not bind to any declared option, in their original order.
    pub leftovers: Vec<String>,
}

/// Everything a builder runtime needs to run one target on one project.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub project: String,
    /// Absolute project root.
    pub project_root: PathBuf,
    pub target: String,
    pub configuration: String,
    pub builder: BuilderId,
    /// Defaults merged with command-line overrides.
    pub options: OptionMap,
    /// Bare leftover tokens accepted because the schema allows additional properties.
    pub extra_args: Vec<String>,
}

/// The outcome of a single builder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Converts `default_project` into `defaultProject`.
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
