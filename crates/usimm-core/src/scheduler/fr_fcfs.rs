//! FR-FCFS: scan for any currently-issuable column access first, then fall
//! back to arrival-order FCFS; auto-precharge once a bank's consecutive
//! hit count reaches a cap (§4.7).

use super::{fcfs_fallback, update_drain_flag, SchedulerPolicy};
use crate::bank::BankState;
use crate::controller::Controller;
use crate::request::{NextCommand, Operation};
use usimm_config::SimConfig;

/// Consecutive column-hit cap before a bank is auto-precharged. Not a
/// config-file token (§6 has none for it); fixed here, matching the
/// reference scheduler's hard-coded constant.
const CAP_N: u32 = 4;

pub struct FrFcfs {
    draining: Vec<bool>,
    cap_n: u32,
}

impl FrFcfs {
    #[must_use]
    pub fn new(num_channels: usize) -> Self {
        Self { draining: vec![false; num_channels], cap_n: CAP_N }
    }

    fn try_issue_hit(&self, ctl: &mut Controller, channel: usize) -> bool {
        for op in [Operation::Read, Operation::Write] {
            let now = ctl.cycle;
            let len = ctl.channels[channel].queues.queue(op).len();
            for i in 0..len {
                let (next_command, issuable, rank, bank) = {
                    let req = &ctl.channels[channel].queues.queue(op)[i];
                    (req.next_command, req.command_issuable, req.decoded.rank, req.decoded.bank)
                };
                if !issuable {
                    continue;
                }
                let hits = ctl.channels[channel].ranks[rank].banks[bank].consecutive_hits;
                let auto_precharge = hits + 1 >= self.cap_n;
                match (op, next_command) {
                    (Operation::Read, NextCommand::ColRead) => {
                        ctl.issue_col_read(channel, rank, bank, i, now, auto_precharge);
                        return true;
                    }
                    (Operation::Write, NextCommand::ColWrite) => {
                        ctl.issue_col_write(channel, rank, bank, i, now, auto_precharge);
                        return true;
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn try_eager_precharge(&self, ctl: &mut Controller, channel: usize) -> bool {
        let now = ctl.cycle;
        let num_ranks = ctl.channels[channel].ranks.len();
        for rank in 0..num_ranks {
            let num_banks = ctl.channels[channel].ranks[rank].banks.len();
            for bank in 0..num_banks {
                let over_cap = {
                    let bk = &ctl.channels[channel].ranks[rank].banks[bank];
                    bk.state == BankState::RowActive && bk.consecutive_hits >= self.cap_n
                };
                if over_cap && ctl.is_precharge_allowed(channel, rank, bank, now) {
                    ctl.issue_precharge(channel, rank, bank, now);
                    ctl.channels[channel].ranks[rank].banks[bank].consecutive_hits = 0;
                    return true;
                }
            }
        }
        false
    }
}

impl SchedulerPolicy for FrFcfs {
    fn init(&mut self, _cfg: &SimConfig) {}

    fn schedule(&mut self, ctl: &mut Controller, channel: usize) {
        update_drain_flag(ctl, channel, &mut self.draining[channel]);
        if self.try_issue_hit(ctl, channel) {
            return;
        }
        if fcfs_fallback(ctl, channel, self.draining[channel]) {
            return;
        }
        self.try_eager_precharge(ctl, channel);
    }

    fn report_stats(&self) -> String {
        format!("scheduler=fr_fcfs cap_n={}", self.cap_n)
    }
}
