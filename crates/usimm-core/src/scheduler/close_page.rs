//! Close-page: FCFS, plus a preemptive precharge of any bank that recently
//! serviced a column access when nothing else issued this cycle (§4.7).

use super::{fcfs_fallback, update_drain_flag, SchedulerPolicy};
use crate::bank::BankState;
use crate::controller::Controller;
use usimm_config::SimConfig;

pub struct ClosePage {
    draining: Vec<bool>,
}

impl ClosePage {
    #[must_use]
    pub fn new(num_channels: usize) -> Self {
        Self { draining: vec![false; num_channels] }
    }
}

impl SchedulerPolicy for ClosePage {
    fn init(&mut self, _cfg: &SimConfig) {}

    fn schedule(&mut self, ctl: &mut Controller, channel: usize) {
        update_drain_flag(ctl, channel, &mut self.draining[channel]);
        if fcfs_fallback(ctl, channel, self.draining[channel]) {
            return;
        }

        let now = ctl.cycle;
        let num_ranks = ctl.channels[channel].ranks.len();
        for rank in 0..num_ranks {
            let num_banks = ctl.channels[channel].ranks[rank].banks.len();
            for bank in 0..num_banks {
                let recently_hit = {
                    let bk = &ctl.channels[channel].ranks[rank].banks[bank];
                    bk.state == BankState::RowActive && bk.consecutive_hits > 0
                };
                if recently_hit && ctl.is_precharge_allowed(channel, rank, bank, now) {
                    ctl.issue_precharge(channel, rank, bank, now);
                    ctl.channels[channel].ranks[rank].banks[bank].consecutive_hits = 0;
                    return;
                }
            }
        }
    }

    fn report_stats(&self) -> String {
        "scheduler=close_page".to_string()
    }
}
