//! The end-of-run textual stats report (§4.14, §6): a banner, an echo of
//! every resolved configuration parameter, per-channel queue stats,
//! per-rank occupancy/power breakdown, total system power, and EDP.
//!
//! Pure formatting: every field printed here is read from the
//! `Controller`'s accumulated counters and the power model's output, none
//! of it computed in this crate.

use std::fmt::Write as _;
use usimm_config::{SimConfig, Ticks};
use usimm_core::Controller;

/// Builds the full textual report as a single string, ready to print to
/// stdout.
#[must_use]
pub fn format_report(cfg: &SimConfig, ctl: &Controller, scheduler_name: &str, scheduler_stats: &str, active_core_fractions: &[f64]) -> String {
    let mut out = String::new();
    write_banner(&mut out, scheduler_name);
    write_parameters(&mut out, cfg);
    write_channel_stats(&mut out, ctl);

    let report = ctl.power.report(cfg, active_core_fractions);
    write_power(&mut out, &report, ctl.cycle, cfg.dram_clk_frequency);

    writeln!(out, "\nSCHEDULER: {scheduler_stats}").expect("writing to a String never fails");
    out
}

fn write_banner(out: &mut String, scheduler_name: &str) {
    writeln!(out, "USIMM memory system simulation report").expect("writing to a String never fails");
    writeln!(out, "scheduler policy: {scheduler_name}").expect("writing to a String never fails");
}

fn write_parameters(out: &mut String, cfg: &SimConfig) {
    writeln!(out, "\nCONFIGURATION").expect("writing to a String never fails");
    macro_rules! p {
        ($name:expr, $value:expr) => {
            writeln!(out, "  {:<24} {}", $name, $value).expect("writing to a String never fails")
        };
    }
    p!("PROCESSOR_CLK_MULTIPLIER", cfg.processor_clk_multiplier);
    p!("ROBSIZE", cfg.rob_size);
    p!("MAX_RETIRE", cfg.max_retire);
    p!("MAX_FETCH", cfg.max_fetch);
    p!("PIPELINEDEPTH", cfg.pipeline_depth.get());
    p!("NUM_CHANNELS", cfg.num_channels);
    p!("NUM_RANKS", cfg.num_ranks);
    p!("NUM_BANKS", cfg.num_banks);
    p!("NUM_ROWS", cfg.num_rows);
    p!("NUM_COLUMNS", cfg.num_columns);
    p!("CACHE_LINE_SIZE", cfg.cache_line_size);
    p!("ADDRESS_BITS", cfg.address_bits);
    p!("ADDRESS_MAPPING", format!("{:?}", cfg.address_mapping));
    p!("DRAM_CLK_FREQUENCY", cfg.dram_clk_frequency);
    p!("T_RCD", cfg.t_rcd.get());
    p!("T_RP", cfg.t_rp.get());
    p!("T_CAS", cfg.t_cas.get());
    p!("T_RC", cfg.t_rc.get());
    p!("T_RAS", cfg.t_ras.get());
    p!("T_RRD", cfg.t_rrd.get());
    p!("T_FAW", cfg.t_faw.get());
    p!("T_WR", cfg.t_wr.get());
    p!("T_WTR", cfg.t_wtr.get());
    p!("T_RTP", cfg.t_rtp.get());
    p!("T_CCD", cfg.t_ccd.get());
    p!("T_RFC", cfg.t_rfc.get());
    p!("T_REFI", cfg.t_refi.get());
    p!("T_CWD", cfg.t_cwd.get());
    p!("T_RTRS", cfg.t_rtrs.get());
    p!("T_PD_MIN", cfg.t_pd_min.get());
    p!("T_XP", cfg.t_xp.get());
    p!("T_XP_DLL", cfg.t_xp_dll.get());
    p!("T_DATA_TRANS", cfg.t_data_trans.get());
    p!("VDD", cfg.vdd);
    p!("IDD0", cfg.idd0);
    p!("IDD2P0", cfg.idd2p0);
    p!("IDD2P1", cfg.idd2p1);
    p!("IDD2N", cfg.idd2n);
    p!("IDD3P", cfg.idd3p);
    p!("IDD3N", cfg.idd3n);
    p!("IDD4R", cfg.idd4r);
    p!("IDD4W", cfg.idd4w);
    p!("IDD5", cfg.idd5);
    p!("WQ_CAPACITY", cfg.wq_capacity);
    p!("WQ_LOOKUP_LATENCY", cfg.wq_lookup_latency.get());
}

fn write_channel_stats(out: &mut String, ctl: &Controller) {
    writeln!(out, "\nCHANNEL STATS").expect("writing to a String never fails");
    for (idx, channel) in ctl.channels.iter().enumerate() {
        writeln!(
            out,
            "  channel {idx}: read_queue={} write_queue={} reads_merged={} writes_merged={}",
            channel.queues.read_len(),
            channel.queues.write_len(),
            channel.queues.reads_merged,
            channel.queues.writes_merged,
        )
        .expect("writing to a String never fails");
    }
}

fn write_power(out: &mut String, report: &usimm_core::PowerReport, cycle: Ticks, dram_clk_frequency_mhz: u64) {
    writeln!(out, "\nRANK POWER (watts)").expect("writing to a String never fails");
    for rank in &report.ranks {
        writeln!(
            out,
            "  channel {} rank {}: act={:.4} read={:.4} write={:.4} refresh={:.4} standby={:.4} act_pdn={:.4} pre_pdn_slow={:.4} pre_pdn_fast={:.4} background={:.4} total={:.4}",
            rank.channel,
            rank.rank,
            rank.act_power,
            rank.read_power,
            rank.write_power,
            rank.refresh_power,
            rank.active_standby_power,
            rank.active_powerdown_power,
            rank.precharge_slow_power,
            rank.precharge_fast_power,
            rank.background_power,
            rank.total,
        )
        .expect("writing to a String never fails");
    }

    writeln!(out, "\nSYSTEM POWER").expect("writing to a String never fails");
    writeln!(out, "  memory power:  {:.4} W", report.memory_power).expect("writing to a String never fails");
    writeln!(out, "  core power:    {:.4} W", report.core_power).expect("writing to a String never fails");
    writeln!(out, "  misc power:    {:.4} W", report.misc_power).expect("writing to a String never fails");
    writeln!(out, "  total power:   {:.4} W", report.total_power).expect("writing to a String never fails");
    writeln!(out, "  EDP:           {:.6}", report.edp(cycle, dram_clk_frequency_mhz)).expect("writing to a String never fails");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_contains_expected_sections() {
        let cfg = SimConfig::default();
        let ctl = Controller::new(&cfg, 1);
        let text = format_report(&cfg, &ctl, "fcfs", "scheduler=fcfs", &[1.0]);
        assert!(text.contains("USIMM memory system simulation report"));
        assert!(text.contains("CONFIGURATION"));
        assert!(text.contains("CHANNEL STATS"));
        assert!(text.contains("RANK POWER"));
        assert!(text.contains("SYSTEM POWER"));
        assert!(text.contains("EDP:"));
        assert!(text.contains("scheduler=fcfs"));
    }
}
