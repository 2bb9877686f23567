//! Entry point for the tunnel daemon host.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match tunneld::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed yet when configuration fails.
            // A failed write to stderr leaves nowhere else to report, and the
            // exit code still signals the failure.
            drop(writeln!(io::stderr(), "tunneld: {error}"));
            ExitCode::FAILURE
        }
    }
}
