// src/core/mod.rs

pub mod builder;
pub mod disambiguation;
pub mod error_translator;
pub mod errors;
pub mod help;
pub mod override_parser;
pub mod project_index;
pub mod scheduler;
pub mod schema;
pub mod specifier;
pub mod target_runner;

#[cfg(test)]
pub(crate) mod test_support;
