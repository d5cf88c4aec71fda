// src/cli/handlers/mod.rs

pub mod list;
pub mod run;
pub mod target;
