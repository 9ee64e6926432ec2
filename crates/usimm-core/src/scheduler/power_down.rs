//! Power-down: FCFS, plus an idle-cycle counter per rank that triggers
//! `PWR_DN_FAST` once a rank has sat idle long enough (§4.7).
//!
//! Waking is implicit: once a request targets a bank in a powerdown
//! state, `update_queue_commands` already flags `PowerUp` as that
//! request's `next_command`, so the ordinary FCFS issue path wakes the
//! rank. A force-refresh also wakes every bank unconditionally (§4.5).

use super::{fcfs_fallback, update_drain_flag, SchedulerPolicy};
use crate::controller::Controller;
use usimm_config::SimConfig;

/// Consecutive idle DRAM ticks before a rank is powered down. Not a
/// config-file token; fixed here, matching the reference scheduler's
/// hard-coded constant.
const PWR_N: u64 = 50;

pub struct PowerDown {
    draining: Vec<bool>,
}

impl PowerDown {
    #[must_use]
    pub fn new(num_channels: usize) -> Self {
        Self { draining: vec![false; num_channels] }
    }
}

impl SchedulerPolicy for PowerDown {
    fn init(&mut self, _cfg: &SimConfig) {}

    fn schedule(&mut self, ctl: &mut Controller, channel: usize) {
        update_drain_flag(ctl, channel, &mut self.draining[channel]);
        if fcfs_fallback(ctl, channel, self.draining[channel]) {
            for rank in &mut ctl.channels[channel].ranks {
                rank.idle_cycles = 0;
            }
            return;
        }

        let now = ctl.cycle;
        let num_ranks = ctl.channels[channel].ranks.len();
        for rank in 0..num_ranks {
            let is_idle = ctl.channels[channel].ranks[rank].is_idle();
            if is_idle {
                ctl.channels[channel].ranks[rank].idle_cycles += 1;
            } else {
                ctl.channels[channel].ranks[rank].idle_cycles = 0;
            }

            let idle_long_enough = ctl.channels[channel].ranks[rank].idle_cycles >= PWR_N;
            if idle_long_enough && ctl.is_powerdown_fast_allowed(channel, rank, now) {
                ctl.issue_powerdown(channel, rank, now, true);
                ctl.channels[channel].ranks[rank].idle_cycles = 0;
                return;
            }
        }
    }

    fn report_stats(&self) -> String {
        format!("scheduler=power_down pwr_n={PWR_N}")
    }
}
