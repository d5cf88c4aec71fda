// src/bin/xrun.rs

use clap::Parser;
use colored::*;
use xrun::{
    cli::{Cli, dispatcher},
    constants::EXIT_FAILURE,
};

/// Sets up logging, dispatches the command and turns its outcome into the exit code.
///
/// Target commands report their own fatal errors and return a code. Anything
/// that fails before that (parsing, loading the workspace) is printed here.
#[tokio::main]
async fn main() {
    env_logger::init();

    let code = match dispatcher::dispatch(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
