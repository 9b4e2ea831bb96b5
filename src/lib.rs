//! Core library for the `conductor` CLI.
//!
//! Turns a project plan into a dependency-ordered execution plan, tracks
//! blocked work as failures cascade through the dependency graph, and gates
//! agent handbacks before a task is marked done.

pub mod adapters;
pub mod blocking;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod graph;
pub mod handback;
pub mod logging;
pub mod plan;
pub mod ports;
pub mod store;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
/// `--help` and `--version` print to stdout and succeed.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli.command)
}
