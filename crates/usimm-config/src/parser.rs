//! Line-oriented, whitespace-tokenized config file parsing.
//!
//! The config-file format (§6): `TOKEN value` per line,
//! `//`-prefixed comment lines and blank lines skipped. No generic config
//! crate is used — the token set is small, fixed, and each token needs its
//! own unit conversion, so a hand-rolled line parser is the most direct way
//! to express it (this codebase's `format-*` crates take the same approach
//! for other small fixed-grammar formats).

use std::collections::HashSet;
use std::path::Path;

use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::mapping::AddressMapping;
use crate::ticks::Ticks;

/// Tokens that belong to topology or timing, and so may not be redefined by
/// a second (electrical `.vi`) config file.
const TOPOLOGY_AND_TIMING_TOKENS: &[&str] = &[
    "PROCESSOR_CLK_MULTIPLIER",
    "ROBSIZE",
    "MAX_RETIRE",
    "MAX_FETCH",
    "PIPELINEDEPTH",
    "NUM_CHANNELS",
    "NUM_RANKS",
    "NUM_BANKS",
    "NUM_ROWS",
    "NUM_COLUMNS",
    "CACHE_LINE_SIZE",
    "ADDRESS_BITS",
    "DRAM_CLK_FREQUENCY",
    "T_RCD",
    "T_RP",
    "T_CAS",
    "T_RC",
    "T_RAS",
    "T_RRD",
    "T_FAW",
    "T_WR",
    "T_WTR",
    "T_RTP",
    "T_CCD",
    "T_RFC",
    "T_REFI",
    "T_CWD",
    "T_RTRS",
    "T_PD_MIN",
    "T_XP",
    "T_XP_DLL",
    "T_DATA_TRANS",
];

/// Loads a `SimConfig` from a primary system config file and an optional
/// second chip-electrical (`.vi`) file applied afterward.
pub fn load(primary: &Path, vi: Option<&Path>) -> Result<SimConfig, ConfigError> {
    let mut cfg = SimConfig::default();
    let mut seen: HashSet<String> = HashSet::new();

    apply_file(primary, &mut cfg, &mut seen, false)?;
    if let Some(vi_path) = vi {
        apply_file(vi_path, &mut cfg, &mut seen, true)?;
    }
    Ok(cfg)
}

fn apply_file(
    path: &Path,
    cfg: &mut SimConfig,
    seen: &mut HashSet<String>,
    is_override_file: bool,
) -> Result<(), ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let mut parts = line.split_whitespace();
        let token = parts.next().ok_or(ConfigError::MalformedLine {
            path: path.to_path_buf(),
            line: line_no,
        })?;
        let raw_value = parts.next().ok_or_else(|| ConfigError::MalformedLine {
            path: path.to_path_buf(),
            line: line_no,
        })?;
        if parts.next().is_some() {
            return Err(ConfigError::MalformedLine {
                path: path.to_path_buf(),
                line: line_no,
            });
        }

        if is_override_file && TOPOLOGY_AND_TIMING_TOKENS.contains(&token) && seen.contains(token)
        {
            return Err(ConfigError::OverrideConflict {
                path: path.to_path_buf(),
                line: line_no,
                token: token.to_string(),
            });
        }

        apply_token(cfg, token, raw_value, path, line_no)?;
        seen.insert(token.to_string());
    }

    Ok(())
}

fn parse_u64(path: &Path, line: usize, token: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| ConfigError::BadValue {
        path: path.to_path_buf(),
        line,
        token: token.to_string(),
        raw: raw.to_string(),
    })
}

fn parse_f64(path: &Path, line: usize, token: &str, raw: &str) -> Result<f64, ConfigError> {
    raw.parse::<f64>().map_err(|_| ConfigError::BadValue {
        path: path.to_path_buf(),
        line,
        token: token.to_string(),
        raw: raw.to_string(),
    })
}

#[allow(clippy::too_many_lines)]
fn apply_token(
    cfg: &mut SimConfig,
    token: &str,
    raw: &str,
    path: &Path,
    line: usize,
) -> Result<(), ConfigError> {
    let int = |raw: &str| parse_u64(path, line, token, raw);
    let flt = |raw: &str| parse_f64(path, line, token, raw);
    let mult = cfg.processor_clk_multiplier;

    match token {
        "PROCESSOR_CLK_MULTIPLIER" => cfg.processor_clk_multiplier = int(raw)?,
        "ROBSIZE" => cfg.rob_size = int(raw)? as usize,
        "MAX_RETIRE" => cfg.max_retire = int(raw)? as usize,
        "MAX_FETCH" => cfg.max_fetch = int(raw)? as usize,
        "PIPELINEDEPTH" => cfg.pipeline_depth = Ticks::new(int(raw)?),

        "NUM_CHANNELS" => cfg.num_channels = int(raw)? as usize,
        "NUM_RANKS" => cfg.num_ranks = int(raw)? as usize,
        "NUM_BANKS" => cfg.num_banks = int(raw)? as usize,
        "NUM_ROWS" => cfg.num_rows = int(raw)? as usize,
        "NUM_COLUMNS" => cfg.num_columns = int(raw)? as usize,
        "CACHE_LINE_SIZE" => cfg.cache_line_size = int(raw)? as usize,
        "ADDRESS_BITS" => cfg.address_bits = int(raw)? as u32,
        "DRAM_CLK_FREQUENCY" => cfg.dram_clk_frequency = int(raw)?,

        "T_RCD" => cfg.t_rcd = Ticks::new(int(raw)? * mult),
        "T_RP" => cfg.t_rp = Ticks::new(int(raw)? * mult),
        "T_CAS" => cfg.t_cas = Ticks::new(int(raw)? * mult),
        "T_RC" => cfg.t_rc = Ticks::new(int(raw)? * mult),
        "T_RAS" => cfg.t_ras = Ticks::new(int(raw)? * mult),
        "T_RRD" => cfg.t_rrd = Ticks::new(int(raw)? * mult),
        "T_FAW" => cfg.t_faw = Ticks::new(int(raw)? * mult),
        "T_WR" => cfg.t_wr = Ticks::new(int(raw)? * mult),
        "T_WTR" => cfg.t_wtr = Ticks::new(int(raw)? * mult),
        "T_RTP" => cfg.t_rtp = Ticks::new(int(raw)? * mult),
        "T_CCD" => cfg.t_ccd = Ticks::new(int(raw)? * mult),
        "T_RFC" => cfg.t_rfc = Ticks::new(int(raw)? * mult),
        "T_REFI" => cfg.t_refi = Ticks::new(int(raw)? * mult),
        "T_CWD" => cfg.t_cwd = Ticks::new(int(raw)? * mult),
        "T_RTRS" => cfg.t_rtrs = Ticks::new(int(raw)? * mult),
        "T_PD_MIN" => cfg.t_pd_min = Ticks::new(int(raw)? * mult),
        "T_XP" => cfg.t_xp = Ticks::new(int(raw)? * mult),
        "T_XP_DLL" => cfg.t_xp_dll = Ticks::new(int(raw)? * mult),
        "T_DATA_TRANS" => cfg.t_data_trans = Ticks::new(int(raw)? * mult),

        "VDD" => cfg.vdd = flt(raw)?,
        "IDD0" => cfg.idd0 = flt(raw)?,
        "IDD2P0" => cfg.idd2p0 = flt(raw)?,
        "IDD2P1" => cfg.idd2p1 = flt(raw)?,
        "IDD2N" => cfg.idd2n = flt(raw)?,
        "IDD3P" => cfg.idd3p = flt(raw)?,
        "IDD3N" => cfg.idd3n = flt(raw)?,
        "IDD4R" => cfg.idd4r = flt(raw)?,
        "IDD4W" => cfg.idd4w = flt(raw)?,
        "IDD5" => cfg.idd5 = flt(raw)?,

        "WQ_CAPACITY" => cfg.wq_capacity = int(raw)? as usize,
        "ADDRESS_MAPPING" => {
            let value = int(raw)?;
            cfg.address_mapping =
                AddressMapping::from_token(value).ok_or_else(|| ConfigError::BadValue {
                    path: path.to_path_buf(),
                    line,
                    token: token.to_string(),
                    raw: raw.to_string(),
                })?;
        }
        "WQ_LOOKUP_LATENCY" => cfg.wq_lookup_latency = Ticks::new(int(raw)?),
        "SCHEDULER" => cfg.scheduler = raw.to_string(),

        other => {
            return Err(ConfigError::UnknownToken {
                path: path.to_path_buf(),
                line,
                token: other.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> tempfile_like::TempPath {
        tempfile_like::TempPath::new(contents)
    }

    // A tiny self-contained temp-file helper so this crate does not pull in
    // an external tempfile dependency just for a handful of parser tests.
    mod tempfile_like {
        use std::path::{Path, PathBuf};

        pub struct TempPath(PathBuf);

        impl TempPath {
            pub fn new(contents: &str) -> Self {
                let mut path = std::env::temp_dir();
                let unique = format!(
                    "usimm-config-test-{}-{:p}",
                    std::process::id(),
                    contents.as_ptr()
                );
                path.push(unique);
                std::fs::write(&path, contents).expect("write temp config");
                Self(path)
            }
        }

        impl AsRef<Path> for TempPath {
            fn as_ref(&self) -> &Path {
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
    fn parses_recognized_tokens() {
        let path = write_temp(
            "// a comment\nPROCESSOR_CLK_MULTIPLIER 2\nT_RCD 10\nNUM_CHANNELS 4\nADDRESS_MAPPING 2\n",
        );
        let cfg = load(path.as_ref(), None).expect("should parse");
        assert_eq!(cfg.processor_clk_multiplier, 2);
        assert_eq!(cfg.t_rcd, Ticks::new(20));
        assert_eq!(cfg.num_channels, 4);
        assert_eq!(cfg.address_mapping, AddressMapping::Mode2);
    }

    #[test]
    fn rejects_unknown_token() {
        let path = write_temp("BOGUS_TOKEN 1\n");
        let err = load(path.as_ref(), None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownToken { .. }));
    }

    #[test]
    fn vi_file_cannot_override_timing() {
        let base = write_temp("T_RCD 10\n");
        let vi = write_temp("T_RCD 20\n");
        let err = load(base.as_ref(), Some(vi.as_ref())).unwrap_err();
        assert!(matches!(err, ConfigError::OverrideConflict { .. }));
    }

    #[test]
    fn vi_file_can_set_electrical() {
        let base = write_temp("T_RCD 10\n");
        let vi = write_temp("VDD 1.35\nIDD0 55.0\n");
        let cfg = load(base.as_ref(), Some(vi.as_ref())).expect("should parse");
        assert_eq!(cfg.vdd, 1.35);
        assert_eq!(cfg.idd0, 55.0);
    }

    #[test]
    fn scheduler_token_is_a_raw_string() {
        let path = write_temp("SCHEDULER fr_fcfs\n");
        let cfg = load(path.as_ref(), None).expect("should parse");
        assert_eq!(cfg.scheduler, "fr_fcfs");
    }

    #[test]
    fn malformed_line_is_rejected() {
        let path = write_temp("T_RCD\n");
        let err = load(path.as_ref(), None).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedLine { .. }));
    }
}
