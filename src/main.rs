//! Binary entrypoint for the `conductor` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    conductor::logging::init();
    match conductor::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
