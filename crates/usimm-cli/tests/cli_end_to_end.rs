//! End-to-end runs of `usimm_cli::run_from_args` against real config and
//! trace files on disk, exercising the full retire/schedule/fetch loop and
//! the final stats report.

use std::fs;
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("usimm-cli-test-{}-{}", std::process::id(), name));
    fs::write(&path, contents).expect("write temp file");
    path
}

const CONFIG: &str = "\
PROCESSOR_CLK_MULTIPLIER 1
ROBSIZE 8
MAX_RETIRE 2
MAX_FETCH 2
PIPELINEDEPTH 0
NUM_CHANNELS 1
NUM_RANKS 1
NUM_BANKS 2
NUM_ROWS 256
NUM_COLUMNS 64
CACHE_LINE_SIZE 64
ADDRESS_BITS 22
DRAM_CLK_FREQUENCY 800
T_RCD 2
T_RP 2
T_CAS 2
T_RC 6
T_RAS 4
T_RRD 1
T_FAW 4
T_WR 2
T_WTR 2
T_RTP 1
T_CCD 1
T_RFC 4
T_REFI 1000
T_CWD 1
T_RTRS 1
T_PD_MIN 1
T_XP 1
T_XP_DLL 1
T_DATA_TRANS 2
VDD 1.5
IDD0 55.0
IDD2P0 30.0
IDD2P1 25.0
IDD2N 35.0
IDD3P 20.0
IDD3N 40.0
IDD4R 135.0
IDD4W 130.0
IDD5 150.0
WQ_CAPACITY 8
ADDRESS_MAPPING 1
WQ_LOOKUP_LATENCY 1
SCHEDULER fcfs
";

const CORE0_TRACE: &str = "\
2 R 100 1000
1 W 200
3 R 300 1004
";

const CORE1_TRACE: &str = "\
1 W 400
2 R 500 2000
1
";

#[test]
fn two_core_run_produces_a_full_report() {
    let config = write_temp("config.cfg", CONFIG);
    let core0 = write_temp("core0.trace", CORE0_TRACE);
    let core1 = write_temp("core1.trace", CORE1_TRACE);

    let args = vec![
        "usimm".to_string(),
        config.display().to_string(),
        core0.display().to_string(),
        core1.display().to_string(),
    ];

    let report = usimm_cli::run_from_args(&args).expect("simulation should run to completion");

    assert!(report.contains("USIMM memory system simulation report"));
    assert!(report.contains("scheduler policy: fcfs"));
    assert!(report.contains("CONFIGURATION"));
    assert!(report.contains("CHANNEL STATS"));
    assert!(report.contains("RANK POWER"));
    assert!(report.contains("SYSTEM POWER"));
    assert!(report.contains("EDP:"));
}

#[test]
fn too_few_arguments_is_a_usage_error() {
    let args = vec!["usimm".to_string(), "config.cfg".to_string()];
    let err = usimm_cli::run_from_args(&args).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn missing_config_file_is_a_config_error() {
    let args = vec![
        "usimm".to_string(),
        "/nonexistent/path/config.cfg".to_string(),
        "/nonexistent/path/trace0".to_string(),
    ];
    let err = usimm_cli::run_from_args(&args).unwrap_err();
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn address_width_mismatch_is_a_config_error() {
    let mut bad_config = CONFIG.replace("ADDRESS_BITS 22", "ADDRESS_BITS 99");
    bad_config.push_str("// widths no longer sum to ADDRESS_BITS\n");
    let config = write_temp("mismatch.cfg", &bad_config);
    let core0 = write_temp("core0b.trace", CORE0_TRACE);

    let args = vec!["usimm".to_string(), config.display().to_string(), core0.display().to_string()];
    let err = usimm_cli::run_from_args(&args).unwrap_err();
    assert_eq!(err.exit_code(), 4);
}
