// src/constants.rs

/// The name of the workspace configuration file searched for upwards from the cwd.
pub const WORKSPACE_FILENAME: &str = "xrun.toml";

/// Environment variable that points directly at a workspace file.
pub const WORKSPACE_ENV_VAR: &str = "XRUN_WORKSPACE";

/// The package that ships the builders compiled into `xrun` itself.
pub const BUILTIN_PACKAGE: &str = "xrun";

/// Separator between the package and the builder name in a builder id (`xrun:command`).
pub const BUILDER_ID_SEPARATOR: char = ':';

/// Separator of the compact `project:target:configuration` specifier.
pub const SPECIFIER_SEPARATOR: char = ':';

/// Separator used to apply several configurations in order (`production,staging`).
pub const CONFIGURATION_SEPARATOR: char = ',';

/// Names the target commands read as their own flags, so a builder option by
/// any of these names or aliases cannot be set from the command line.
pub const COMMAND_FLAG_NAMES: &[&str] = &["p", "project", "c", "configuration", "prod", "h", "help"];

/// Directories whose presence in the workspace root means dependencies were installed.
pub const DEPENDENCY_MARKERS: &[&str] = &["node_modules", "target", ".venv", "vendor"];

/// Name of the project being run, exported to builder processes.
pub const ENV_PROJECT: &str = "XRUN_PROJECT";
/// Name of the target being run, exported to builder processes.
pub const ENV_TARGET: &str = "XRUN_TARGET";
/// Configuration string being applied, exported to builder processes.
pub const ENV_CONFIGURATION: &str = "XRUN_CONFIGURATION";

/// Exit code of a successful invocation.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code of any failed invocation.
pub const EXIT_FAILURE: i32 = 1;
