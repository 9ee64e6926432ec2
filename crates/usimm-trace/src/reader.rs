//! Streaming trace-file reader.

use crate::error::TraceError;
use crate::record::{MemOp, TraceRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// An iterator over one trace file's records, reading lazily.
pub struct TraceReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl TraceReader {
    /// Opens `path` for streaming. Fails immediately if the file cannot be
    /// opened (§4.13 validates every trace file exists and is readable
    /// before the tick loop starts).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| TraceError::Io { path: path.clone(), source })?;
        Ok(Self { path, lines: BufReader::new(file).lines(), line_no: 0 })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_line(&self, raw: &str) -> Result<Option<TraceRecord>, TraceError> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(None);
        }
        let malformed = || TraceError::MalformedLine { path: self.path.clone(), line: self.line_no };
        let bad_value = |raw: &str| TraceError::BadValue { path: self.path.clone(), line: self.line_no, raw: raw.to_string() };

        let nonmemops: u64 = tokens[0].parse().map_err(|_| bad_value(tokens[0]))?;

        let op = match tokens.len() {
            1 => None,
            3 if tokens[1] == "W" => {
                let address = parse_hex(tokens[2]).map_err(|_| bad_value(tokens[2]))?;
                Some(MemOp::Write { address })
            }
            4 if tokens[1] == "R" => {
                let address = parse_hex(tokens[2]).map_err(|_| bad_value(tokens[2]))?;
                let pc = parse_hex(tokens[3]).map_err(|_| bad_value(tokens[3]))?;
                Some(MemOp::Read { address, pc })
            }
            _ => return Err(malformed()),
        };

        Ok(Some(TraceRecord { nonmemops, op }))
    }
}

fn parse_hex(raw: &str) -> Result<u64, std::num::ParseIntError> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
}

impl Iterator for TraceReader {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next() {
                None => return None,
                Some(Ok(raw)) => raw,
                Some(Err(source)) => return Some(Err(TraceError::Io { path: self.path.clone(), source })),
            };
            self.line_no += 1;
            if raw.trim().is_empty() {
                continue;
            }
            return match self.parse_line(&raw) {
                Ok(Some(record)) => Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => Some(Err(err)),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_trace(contents: &str) -> tempfile_like::TempPath {
        let tmp = tempfile_like::TempPath::new();
        let mut f = File::create(tmp.path()).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        tmp
    }

    mod tempfile_like {
        use std::path::{Path, PathBuf};

        pub struct TempPath(PathBuf);

        impl TempPath {
            pub fn new() -> Self {
                let mut path = std::env::temp_dir();
                let unique = format!("usimm-trace-test-{:?}-{}", std::thread::current().id(), std::process::id());
                path.push(unique);
                Self(path)
            }

            pub fn path(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
    }

    #[test]
    fn parses_read_and_write_lines() {
        let tmp = write_trace("3 R 1a2b 400\n5 W ff\n2\n");
        let mut reader = TraceReader::open(tmp.path()).unwrap();
        let r1 = reader.next().unwrap().unwrap();
        assert_eq!(r1.nonmemops, 3);
        assert_eq!(r1.op, Some(MemOp::Read { address: 0x1a2b, pc: 0x400 }));

        let r2 = reader.next().unwrap().unwrap();
        assert_eq!(r2.op, Some(MemOp::Write { address: 0xff }));

        let r3 = reader.next().unwrap().unwrap();
        assert_eq!(r3.nonmemops, 2);
        assert_eq!(r3.op, None);

        assert!(reader.next().is_none());
    }

    #[test]
    fn rejects_wrong_token_count() {
        let tmp = write_trace("3 R 1a2b\n");
        let mut reader = TraceReader::open(tmp.path()).unwrap();
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, TraceError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn rejects_unparseable_integer() {
        let tmp = write_trace("x R 1a2b 400\n");
        let mut reader = TraceReader::open(tmp.path()).unwrap();
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, TraceError::BadValue { line: 1, .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = TraceReader::open("/nonexistent/path/to/a.trace").unwrap_err();
        assert!(matches!(err, TraceError::Io { .. }));
    }
}
