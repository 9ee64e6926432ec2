//! Fair: a per-thread credit scheme over the read queue. Credits accrue one
//! per cycle (saturating); issuing a `COL_READ` halves the issuing
//! thread's credits; a row-hit ranks 1.5x its raw credit (§4.7).

use super::{fcfs_fallback, update_drain_flag, SchedulerPolicy};
use crate::controller::Controller;
use crate::request::NextCommand;
use usimm_config::SimConfig;

/// Starting (and saturation ceiling) credit value. Not a config-file
/// token; fixed here, matching the reference scheduler's constant.
const MAX_CREDITS: u32 = 1024;

const ROW_HIT_WEIGHT_NUM: u32 = 3;
const ROW_HIT_WEIGHT_DEN: u32 = 2;

pub struct Fair {
    draining: Vec<bool>,
    credits: Vec<u32>,
}

impl Fair {
    #[must_use]
    pub fn new(num_channels: usize, num_threads: usize) -> Self {
        Self { draining: vec![false; num_channels], credits: vec![MAX_CREDITS; num_threads.max(1)] }
    }

    fn credit(&mut self, thread_id: usize) -> u32 {
        if thread_id >= self.credits.len() {
            self.credits.resize(thread_id + 1, MAX_CREDITS);
        }
        self.credits[thread_id]
    }

    fn accrue_all(&mut self) {
        for c in &mut self.credits {
            *c = (*c + 1).min(MAX_CREDITS);
        }
    }

    fn select_best_read(&mut self, ctl: &Controller, channel: usize) -> Option<(usize, NextCommand, usize, usize, usize)> {
        let mut best: Option<(usize, NextCommand, usize, usize, usize, u64)> = None;
        for (i, req) in ctl.channels[channel].queues.reads.iter().enumerate() {
            if !req.command_issuable || req.next_command == NextCommand::Nop {
                continue;
            }
            let base = u64::from(self.credit(req.thread_id));
            let weighted = if req.next_command == NextCommand::ColRead {
                base * u64::from(ROW_HIT_WEIGHT_NUM) / u64::from(ROW_HIT_WEIGHT_DEN)
            } else {
                base
            };
            let better = match &best {
                None => true,
                Some((.., best_weight)) => weighted > *best_weight,
            };
            if better {
                best = Some((i, req.next_command, req.decoded.rank, req.decoded.bank, req.thread_id, weighted));
            }
        }
        best.map(|(i, cmd, rank, bank, tid, _)| (i, cmd, rank, bank, tid))
    }
}

impl SchedulerPolicy for Fair {
    fn init(&mut self, _cfg: &SimConfig) {}

    fn schedule(&mut self, ctl: &mut Controller, channel: usize) {
        update_drain_flag(ctl, channel, &mut self.draining[channel]);
        self.accrue_all();

        if self.draining[channel] && fcfs_fallback(ctl, channel, true) {
            return;
        }

        let now = ctl.cycle;
        if let Some((i, next_command, rank, bank, thread_id)) = self.select_best_read(ctl, channel) {
            match next_command {
                NextCommand::Activate => {
                    let row = ctl.channels[channel].queues.reads[i].decoded.row;
                    ctl.issue_activate(channel, rank, bank, row, now);
                }
                NextCommand::Precharge => ctl.issue_precharge(channel, rank, bank, now),
                NextCommand::PowerUp => ctl.issue_powerup(channel, rank, now),
                NextCommand::ColRead => {
                    ctl.issue_col_read(channel, rank, bank, i, now, false);
                    let credit = self.credit(thread_id);
                    self.credits[thread_id] = credit / 2;
                }
                NextCommand::ColWrite | NextCommand::Nop => {}
            }
            return;
        }

        fcfs_fallback(ctl, channel, self.draining[channel]);
    }

    fn report_stats(&self) -> String {
        format!("scheduler=fair mean_credits={}", mean(&self.credits))
    }
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}
