//! Trace-parsing error kinds.

use std::fmt;
use std::path::PathBuf;

/// A fatal input error, reported at startup or mid-read.
#[derive(Debug)]
pub enum TraceError {
    /// The trace file could not be opened or read.
    Io { path: PathBuf, source: std::io::Error },
    /// A line has the wrong token count for its opchar, or none at all.
    MalformedLine { path: PathBuf, line: usize },
    /// A token that should parse as an integer did not.
    BadValue { path: PathBuf, line: usize, raw: String },
    /// A trace file named `MT<k>` for k>0 with no `MT0` yet opened in this
    /// invocation.
    Mt0Absent { path: PathBuf },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read trace file {}: {source}", path.display()),
            Self::MalformedLine { path, line } => write!(
                f,
                "{}:{line}: expected `<nonmemops> [R <addr> <pc> | W <addr>]`",
                path.display()
            ),
            Self::BadValue { path, line, raw } => {
                write!(f, "{}:{line}: cannot parse integer field {raw:?}", path.display())
            }
            Self::Mt0Absent { path } => write!(
                f,
                "{}: belongs to a multi-threaded group (MTk, k>0) but no MT0 trace was given first",
                path.display()
            ),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
