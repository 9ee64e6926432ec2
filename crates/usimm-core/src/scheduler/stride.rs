//! Stride (prefetching): confirms a per-PC stride after two consecutive
//! equal address deltas, then speculatively activates the predicted next
//! row on an otherwise idle cycle (§4.7).

use super::{fcfs_fallback, update_drain_flag, SchedulerPolicy};
use crate::bank::BankState;
use crate::controller::Controller;
use crate::request::NextCommand;
use std::collections::{HashMap, HashSet};
use usimm_config::SimConfig;

#[derive(Default, Clone, Copy)]
struct StrideEntry {
    last_address: Option<u64>,
    last_delta: Option<i64>,
    confirmed: bool,
}

pub struct Stride {
    draining: Vec<bool>,
    /// Per (thread_id, pc) stride detector.
    table: HashMap<(usize, u64), StrideEntry>,
    /// Global history of `thread_id ^ pc ^ address` keys already
    /// speculated on, so the same prediction is not reissued every tick.
    history: HashSet<u64>,
}

impl Stride {
    #[must_use]
    pub fn new(num_channels: usize, _num_threads: usize) -> Self {
        Self { draining: vec![false; num_channels], table: HashMap::new(), history: HashSet::new() }
    }

    fn observe(&mut self, thread_id: usize, pc: u64, address: u64) -> Option<u64> {
        let entry = self.table.entry((thread_id, pc)).or_default();
        let predicted = if let Some(last_address) = entry.last_address {
            let delta = address as i64 - last_address as i64;
            let confirmed_now = entry.last_delta == Some(delta) && delta != 0;
            if confirmed_now {
                entry.confirmed = true;
            }
            entry.last_delta = Some(delta);
            if entry.confirmed {
                Some((address as i64 + delta) as u64)
            } else {
                None
            }
        } else {
            None
        };
        entry.last_address = Some(address);

        let key = (thread_id as u64) ^ pc ^ address;
        self.history.insert(key);
        predicted
    }

    fn try_prefetch(&mut self, ctl: &mut Controller, channel: usize) -> bool {
        let now = ctl.cycle;
        let predictions: Vec<u64> = {
            let mut out = Vec::new();
            for req in &ctl.channels[channel].queues.reads {
                if let Some(pc) = req.pc {
                    if let Some(entry) = self.table.get(&(req.thread_id, pc)) {
                        if entry.confirmed {
                            if let (Some(last), Some(delta)) = (entry.last_address, entry.last_delta) {
                                out.push((last as i64 + delta) as u64);
                            }
                        }
                    }
                }
            }
            out
        };

        for predicted_addr in predictions {
            let decoded = ctl.decode(predicted_addr);
            if decoded.channel != channel {
                continue;
            }
            let key = predicted_addr ^ 0x9E37_79B9;
            if self.history.contains(&key) {
                continue;
            }
            let bank = &ctl.channels[channel].ranks[decoded.rank].banks[decoded.bank];
            if bank.state != BankState::Idle && bank.state != BankState::Precharging {
                continue;
            }
            if ctl.is_activate_allowed(channel, decoded.rank, decoded.bank, now) {
                ctl.issue_activate(channel, decoded.rank, decoded.bank, decoded.row, now);
                self.history.insert(key);
                return true;
            }
        }
        false
    }
}

impl SchedulerPolicy for Stride {
    fn init(&mut self, _cfg: &SimConfig) {}

    fn schedule(&mut self, ctl: &mut Controller, channel: usize) {
        update_drain_flag(ctl, channel, &mut self.draining[channel]);

        // Train the stride table from whatever reads are currently
        // waiting on a column access, before attempting to issue.
        let observations: Vec<(usize, u64, u64)> = ctl.channels[channel]
            .queues
            .reads
            .iter()
            .filter(|r| r.next_command == NextCommand::ColRead)
            .filter_map(|r| r.pc.map(|pc| (r.thread_id, pc, r.address)))
            .collect();
        for (thread_id, pc, address) in observations {
            self.observe(thread_id, pc, address);
        }

        if fcfs_fallback(ctl, channel, self.draining[channel]) {
            return;
        }
        self.try_prefetch(ctl, channel);
    }

    fn report_stats(&self) -> String {
        let confirmed = self.table.values().filter(|e| e.confirmed).count();
        format!("scheduler=stride confirmed_strides={confirmed}")
    }
}
