//! Configuration-loading error kinds.

use std::fmt;
use std::path::PathBuf;

/// A fatal configuration error, reported at startup.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be opened or read.
    Io { path: PathBuf, source: std::io::Error },
    /// A line names a token this loader does not recognize.
    UnknownToken { path: PathBuf, line: usize, token: String },
    /// A token's value could not be parsed as the expected integer or float.
    BadValue { path: PathBuf, line: usize, token: String, raw: String },
    /// A line has the wrong number of whitespace-separated fields.
    MalformedLine { path: PathBuf, line: usize },
    /// A second (`.vi`) config file tried to redefine a topology or timing
    /// token already set by the first file.
    OverrideConflict { path: PathBuf, line: usize, token: String },
    /// The configured channel+rank+bank+row+column+offset bit widths do not
    /// sum to `ADDRESS_BITS` (after the `log2(NUMCORES)` row augmentation).
    AddressWidthMismatch { sum: u32, expected: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config file {}: {source}", path.display())
            }
            Self::UnknownToken { path, line, token } => write!(
                f,
                "{}:{line}: unrecognized configuration token {token:?}",
                path.display()
            ),
            Self::BadValue { path, line, token, raw } => write!(
                f,
                "{}:{line}: cannot parse value {raw:?} for token {token}",
                path.display()
            ),
            Self::MalformedLine { path, line } => {
                write!(f, "{}:{line}: expected `TOKEN value`", path.display())
            }
            Self::OverrideConflict { path, line, token } => write!(
                f,
                "{}:{line}: {token} redefines a topology/timing token already set by the first config file",
                path.display()
            ),
            Self::AddressWidthMismatch { sum, expected } => write!(
                f,
                "configured address field widths sum to {sum} bits, expected ADDRESS_BITS={expected}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
