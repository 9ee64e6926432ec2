//! `usimm <config> [<vi-file>] <trace0> [<trace1> ...]` (§6).
//!
//! A second config-file argument is treated as the optional chip-electrical
//! `.vi` file (applied after the primary config, §6) when its extension is
//! `.vi`; otherwise every argument after the primary config is a trace file.

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match usimm_cli::run_from_args(&args) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
