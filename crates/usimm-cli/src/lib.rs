//! The CLI driver as a library, so both the `usimm` binary and the crate's
//! integration tests can run a full simulation without shelling out.

pub mod corestate;
pub mod driver;
pub mod error;

use error::CliError;
use std::path::PathBuf;

/// Parses `argv` (with `argv[0]` the program name) and runs the simulation
/// it names, per the usage line in [`CliError::Usage`].
pub fn run_from_args(args: &[String]) -> Result<String, CliError> {
    if args.len() < 3 {
        return Err(CliError::Usage { program: args[0].clone() });
    }

    let config_path = PathBuf::from(&args[1]);
    let rest = &args[2..];
    let (vi_path, trace_args) = if rest[0].to_lowercase().ends_with(".vi") {
        (Some(PathBuf::from(&rest[0])), &rest[1..])
    } else {
        (None, rest)
    };

    if trace_args.is_empty() {
        return Err(CliError::Usage { program: args[0].clone() });
    }

    let trace_paths: Vec<PathBuf> = trace_args.iter().map(PathBuf::from).collect();
    driver::run(&config_path, vi_path.as_deref(), &trace_paths)
}
