//! Top-level CLI errors and their process exit codes (§4.13).
//!
//! A bad invocation exits `3`, a bad config file `4`, a bad trace file `5`,
//! and a trace named `MT<k>`, k>0, with no preceding `MT0`, exits `6`.

use std::fmt;
use std::path::PathBuf;
use usimm_config::ConfigError;
use usimm_trace::TraceError;

#[derive(Debug)]
pub enum CliError {
    /// Fewer than two arguments (a config file and at least one trace).
    Usage { program: String },
    Config(ConfigError),
    Trace(TraceError),
    /// A trace named `MT<k>`, k>0, appeared with no `MT0` trace before it
    /// among this invocation's trace arguments.
    Mt0Absent { path: PathBuf },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { .. } => 3,
            Self::Config(_) => 4,
            Self::Trace(_) => 5,
            Self::Mt0Absent { .. } => 6,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage { program } => {
                write!(f, "usage: {program} <config-file> [<vi-file>] <trace0> [<trace1> ...]")
            }
            Self::Config(err) => write!(f, "{err}"),
            Self::Trace(err) => write!(f, "{err}"),
            Self::Mt0Absent { path } => write!(
                f,
                "{}: belongs to a multi-threaded group (MTk, k>0) but no MT0 trace was given first",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Trace(err) => Some(err),
            Self::Usage { .. } | Self::Mt0Absent { .. } => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<TraceError> for CliError {
    fn from(err: TraceError) -> Self {
        Self::Trace(err)
    }
}
