//! Power accounting: state-occupancy counters during the run, and the
//! end-of-simulation IDD-table derating (§4.8).

use crate::bank::BankState;
use crate::rank::Rank;
use std::collections::HashMap;
use usimm_config::{SimConfig, Ticks};

/// Typical DIMM organization assumption used to scale per-chip IDD currents
/// up to a rank: eight x8 chips make one rank's data width. The reference
/// configuration format has no `CHIPS_PER_RANK` token, so this is a fixed
/// constant rather than a configurable one; see `DESIGN.md`.
const CHIPS_PER_RANK: f64 = 8.0;

/// Baseline miscellaneous system power, plus per additional channel.
const MISC_BASE_WATTS: f64 = 40.0;
const MISC_PER_EXTRA_CHANNEL_WATTS: f64 = 10.0;

/// Per active core power, before the single-channel derating.
const CORE_WATTS: f64 = 10.0;

/// Accumulated state-occupancy and command counters for one (channel,
/// rank), used to derate the IDD table at the end of the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankOccupancy {
    pub active_standby: Ticks,
    pub active_powerdown: Ticks,
    pub precharge_powerdown_slow: Ticks,
    pub precharge_powerdown_fast: Ticks,
    pub refreshing: Ticks,
    pub act_count: u64,
    pub read_count: u64,
    pub write_count: u64,
    pub refresh_count: u64,
}

/// Collects per-(channel, rank) occupancy and command counters throughout
/// the run; produces a `PowerReport` once the run terminates.
#[derive(Debug, Clone, Default)]
pub struct PowerModel {
    occupancy: HashMap<(usize, usize), RankOccupancy>,
    total_ticks: Ticks,
}

impl PowerModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, channel: usize, rank: usize) -> &mut RankOccupancy {
        self.occupancy.entry((channel, rank)).or_default()
    }

    /// Call once per DRAM tick, after the scheduler has run, for every
    /// (channel, rank).
    pub fn observe_occupancy(&mut self, channel: usize, rank: usize, rk: &Rank, dram_tick_ticks: u64) {
        let delta = Ticks::new(dram_tick_ticks);
        self.total_ticks += delta;
        let entry = self.entry(channel, rank);
        if rk.banks.iter().all(|b| b.state == BankState::ActivePowerDown) {
            entry.active_powerdown += delta;
        } else if rk.banks.iter().all(|b| b.state == BankState::PrechargePowerDownSlow) {
            entry.precharge_powerdown_slow += delta;
        } else if rk.banks.iter().all(|b| b.state == BankState::PrechargePowerDownFast) {
            entry.precharge_powerdown_fast += delta;
        } else if rk.banks.iter().all(|b| b.state == BankState::Refreshing) {
            entry.refreshing += delta;
        } else {
            entry.active_standby += delta;
        }
    }

    pub fn record_activate(&mut self, channel: usize, rank: usize) {
        self.entry(channel, rank).act_count += 1;
    }

    pub fn record_read(&mut self, channel: usize, rank: usize) {
        self.entry(channel, rank).read_count += 1;
    }

    pub fn record_write(&mut self, channel: usize, rank: usize) {
        self.entry(channel, rank).write_count += 1;
    }

    pub fn record_refresh(&mut self, channel: usize, rank: usize) {
        self.entry(channel, rank).refresh_count += 1;
    }

    /// Derates the IDD table by observed occupancy/command counts and
    /// produces the final power breakdown.
    #[must_use]
    pub fn report(&self, cfg: &SimConfig, active_core_fractions: &[f64]) -> PowerReport {
        let total = self.total_ticks.get().max(1) as f64;
        let mut ranks = Vec::new();

        let mut keys: Vec<_> = self.occupancy.keys().copied().collect();
        keys.sort_unstable();
        for (channel, rank) in keys {
            let occ = self.occupancy[&(channel, rank)];
            let act_power = cfg.vdd * cfg.idd0 * (occ.act_count as f64 * cfg.t_rc.get() as f64 / total);
            let read_power = cfg.vdd * cfg.idd4r * (occ.read_count as f64 * cfg.t_data_trans.get() as f64 / total);
            let write_power = cfg.vdd * cfg.idd4w * (occ.write_count as f64 * cfg.t_data_trans.get() as f64 / total);
            let refresh_power = cfg.vdd * cfg.idd5 * (occ.refresh_count as f64 * cfg.t_rfc.get() as f64 / total);
            let active_standby_power = cfg.vdd * cfg.idd3n * (occ.active_standby.get() as f64 / total);
            let active_powerdown_power = cfg.vdd * cfg.idd3p * (occ.active_powerdown.get() as f64 / total);
            let precharge_slow_power =
                cfg.vdd * cfg.idd2p1 * (occ.precharge_powerdown_slow.get() as f64 / total);
            let precharge_fast_power =
                cfg.vdd * cfg.idd2p0 * (occ.precharge_powerdown_fast.get() as f64 / total);
            let background_power = cfg.vdd * cfg.idd2n * (occ.refreshing.get() as f64 / total);

            let rank_power = (act_power
                + read_power
                + write_power
                + refresh_power
                + active_standby_power
                + active_powerdown_power
                + precharge_slow_power
                + precharge_fast_power
                + background_power)
                * CHIPS_PER_RANK;

            ranks.push(RankPower {
                channel,
                rank,
                act_power,
                read_power,
                write_power,
                refresh_power,
                active_standby_power,
                active_powerdown_power,
                precharge_slow_power,
                precharge_fast_power,
                background_power,
                total: rank_power,
            });
        }

        let memory_power: f64 = ranks.iter().map(|r| r.total).sum();

        let mut core_power = active_core_fractions.iter().map(|f| CORE_WATTS * f).sum::<f64>();
        if cfg.num_channels == 1 {
            core_power /= 2.0;
        }

        let extra_channels = cfg.num_channels.saturating_sub(1) as f64;
        let misc_power = MISC_BASE_WATTS + MISC_PER_EXTRA_CHANNEL_WATTS * extra_channels;

        let total_power = memory_power + core_power + misc_power;

        PowerReport { ranks, memory_power, core_power, misc_power, total_power }
    }
}

/// One rank's derated power components.
#[derive(Debug, Clone, Copy)]
pub struct RankPower {
    pub channel: usize,
    pub rank: usize,
    pub act_power: f64,
    pub read_power: f64,
    pub write_power: f64,
    pub refresh_power: f64,
    pub active_standby_power: f64,
    pub active_powerdown_power: f64,
    pub precharge_slow_power: f64,
    pub precharge_fast_power: f64,
    pub background_power: f64,
    pub total: f64,
}

/// The full end-of-run power report.
#[derive(Debug, Clone)]
pub struct PowerReport {
    pub ranks: Vec<RankPower>,
    pub memory_power: f64,
    pub core_power: f64,
    pub misc_power: f64,
    pub total_power: f64,
}

impl PowerReport {
    /// Energy-Delay Product: total system power times simulated wall-time
    /// squared, where wall-time is `CYCLE / DRAM_CLK_FREQUENCY` seconds
    /// (`DRAM_CLK_FREQUENCY` is read in MHz, matching the datasheet-style
    /// electrical tokens in `§6`).
    #[must_use]
    pub fn edp(&self, cycle: Ticks, dram_clk_frequency_mhz: u64) -> f64 {
        let seconds = cycle.get() as f64 / (dram_clk_frequency_mhz.max(1) as f64 * 1e6);
        self.total_power * seconds * seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_with_no_activity_is_zero_memory_power() {
        let cfg = SimConfig::default();
        let model = PowerModel::new();
        let report = model.report(&cfg, &[]);
        assert_eq!(report.memory_power, 0.0);
        assert_eq!(report.misc_power, 40.0);
    }

    #[test]
    fn extra_channels_increase_misc_power() {
        let mut cfg = SimConfig::default();
        cfg.num_channels = 3;
        let model = PowerModel::new();
        let report = model.report(&cfg, &[]);
        assert_eq!(report.misc_power, 40.0 + 10.0 * 2.0);
    }
}
