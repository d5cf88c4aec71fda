//! # System Interaction Layer
//!
//! Everything that touches the filesystem or spawns processes lives here,
//! behind the seams the `core` engine defines.
//!
//! ## Modules
//!
//! - **`workspace_loader`**: finds and parses `xrun.toml` into a `Workspace`.
//! - **`registry`**: the builders a workspace can use, built-in and declared.
//!   Implements `OptionSchemaBinder`.
//! - **`runtime`**: validates merged options and runs builders as local
//!   processes. Implements `BuilderRuntime`.
//! - **`executor`**: spawns and awaits child processes with `Ctrl+C` handling.
//! - **`install_check`**: tells whether the workspace had its dependencies installed.

pub mod executor;
pub mod install_check;
pub mod registry;
pub mod runtime;
pub mod workspace_loader;
