//! Service-quality: a confidence-indexed value estimator ranks issuable
//! reads by an importance weight predicted from PC and per-thread memory
//! history, combined with an aging ticket so no thread starves; a
//! parallel per-(thread, PC) row predictor drives speculative activation
//! once its confidence saturates (§4.7).
//!
//! A full multi-table, tag-checked TAGE predictor is condensed here to a
//! single hashed table of saturating counters — see `DESIGN.md` for why
//! that substitution preserves the policy's observable behavior
//! (confidence-ranked issue order, speculative activation on saturation)
//! without the tag-matching machinery.

use super::{fcfs_fallback, update_drain_flag, SchedulerPolicy};
use crate::bank::BankState;
use crate::controller::Controller;
use crate::request::NextCommand;
use std::collections::HashMap;
use usimm_config::SimConfig;

const TABLE_BITS: u32 = 10;
const TABLE_SIZE: usize = 1 << TABLE_BITS;
const TABLE_MASK: u64 = (TABLE_SIZE as u64) - 1;
const COUNTER_MAX: i8 = 7;
const COUNTER_MIN: i8 = -8;
const SATURATION_THRESHOLD: i8 = 6;
/// Per-cycle aging step added to a waiting thread's priority ticket, so a
/// consistently low-confidence thread is not starved forever.
const TICKET_AGING_STEP: u32 = 1;

pub struct ServiceQuality {
    draining: Vec<bool>,
    confidence: Vec<i8>,
    /// Per-thread shifting history register of recently touched
    /// (bank, row) pairs, folded into the table index alongside the PC.
    history: Vec<u64>,
    priority_tickets: Vec<u32>,
    /// Per-(thread, PC) last row touched, for the row-touch predictor.
    predicted_row: HashMap<(usize, u64), usize>,
}

impl ServiceQuality {
    #[must_use]
    pub fn new(num_channels: usize, num_threads: usize) -> Self {
        Self {
            draining: vec![false; num_channels],
            confidence: vec![0; TABLE_SIZE],
            history: vec![0; num_threads.max(1)],
            priority_tickets: vec![0; num_threads.max(1)],
            predicted_row: HashMap::new(),
        }
    }

    fn ensure_thread(&mut self, thread_id: usize) {
        if thread_id >= self.history.len() {
            self.history.resize(thread_id + 1, 0);
            self.priority_tickets.resize(thread_id + 1, 0);
        }
    }

    fn table_index(&self, thread_id: usize, pc: u64) -> usize {
        let history = self.history.get(thread_id).copied().unwrap_or(0);
        let mixed = pc.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(history);
        let folded = mixed ^ (mixed >> 32);
        (folded & TABLE_MASK) as usize
    }

    fn weight(&mut self, thread_id: usize, pc: u64) -> i64 {
        self.ensure_thread(thread_id);
        let confidence = i64::from(self.confidence[self.table_index(thread_id, pc)]);
        let ticket = i64::from(self.priority_tickets[thread_id]);
        confidence + ticket
    }

    fn record_issue(&mut self, thread_id: usize, pc: u64, bank: usize, row: usize) {
        self.ensure_thread(thread_id);
        let idx = self.table_index(thread_id, pc);
        self.confidence[idx] = (self.confidence[idx] + 1).clamp(COUNTER_MIN, COUNTER_MAX);
        self.history[thread_id] = self.history[thread_id].wrapping_shl(7) ^ ((bank as u64) << 16) ^ (row as u64);
        self.priority_tickets[thread_id] = 0;
        self.predicted_row.insert((thread_id, pc), row);
    }

    fn age_waiting_threads(&mut self, waiting: &[usize]) {
        for &thread_id in waiting {
            self.ensure_thread(thread_id);
            self.priority_tickets[thread_id] = self.priority_tickets[thread_id].saturating_add(TICKET_AGING_STEP);
        }
    }

    fn select_best_read(&mut self, ctl: &Controller, channel: usize) -> Option<(usize, NextCommand, usize, usize, usize, u64)> {
        let mut best: Option<(usize, NextCommand, usize, usize, usize, u64, i64)> = None;
        for (i, req) in ctl.channels[channel].queues.reads.iter().enumerate() {
            if !req.command_issuable || req.next_command == NextCommand::Nop {
                continue;
            }
            let pc = req.pc.unwrap_or(req.address);
            let weight = self.weight(req.thread_id, pc);
            let better = match &best {
                None => true,
                Some((.., best_weight)) => weight > *best_weight,
            };
            if better {
                best = Some((i, req.next_command, req.decoded.rank, req.decoded.bank, req.thread_id, pc, weight));
            }
        }
        best.map(|(i, cmd, rank, bank, tid, pc, _)| (i, cmd, rank, bank, tid, pc))
    }

    fn try_speculative_activate(&mut self, ctl: &mut Controller, channel: usize) -> bool {
        let now = ctl.cycle;
        let candidates: Vec<((usize, u64), usize)> =
            self.predicted_row.iter().map(|(k, &row)| (*k, row)).collect();
        for ((thread_id, pc), row) in candidates {
            let idx = self.table_index(thread_id, pc);
            if self.confidence[idx] < SATURATION_THRESHOLD {
                continue;
            }
            for rank in 0..ctl.channels[channel].ranks.len() {
                for bank in 0..ctl.channels[channel].ranks[rank].banks.len() {
                    let bk = &ctl.channels[channel].ranks[rank].banks[bank];
                    if bk.state != BankState::Idle || bk.active_row == Some(row) {
                        continue;
                    }
                    if ctl.is_activate_allowed(channel, rank, bank, now) {
                        ctl.issue_activate(channel, rank, bank, row, now);
                        return true;
                    }
                }
            }
        }
        false
    }
}

impl SchedulerPolicy for ServiceQuality {
    fn init(&mut self, _cfg: &SimConfig) {}

    fn schedule(&mut self, ctl: &mut Controller, channel: usize) {
        update_drain_flag(ctl, channel, &mut self.draining[channel]);

        let waiting: Vec<usize> = ctl.channels[channel].queues.reads.iter().map(|r| r.thread_id).collect();
        self.age_waiting_threads(&waiting);

        if self.draining[channel] && fcfs_fallback(ctl, channel, true) {
            return;
        }

        let now = ctl.cycle;
        if let Some((i, next_command, rank, bank, thread_id, pc)) = self.select_best_read(ctl, channel) {
            match next_command {
                NextCommand::Activate => {
                    let row = ctl.channels[channel].queues.reads[i].decoded.row;
                    ctl.issue_activate(channel, rank, bank, row, now);
                }
                NextCommand::Precharge => ctl.issue_precharge(channel, rank, bank, now),
                NextCommand::PowerUp => ctl.issue_powerup(channel, rank, now),
                NextCommand::ColRead => {
                    let row = ctl.channels[channel].queues.reads[i].decoded.row;
                    ctl.issue_col_read(channel, rank, bank, i, now, false);
                    self.record_issue(thread_id, pc, bank, row);
                }
                NextCommand::ColWrite | NextCommand::Nop => {}
            }
            return;
        }

        if fcfs_fallback(ctl, channel, self.draining[channel]) {
            return;
        }
        self.try_speculative_activate(ctl, channel);
    }

    fn report_stats(&self) -> String {
        let saturated = self.confidence.iter().filter(|&&c| c >= SATURATION_THRESHOLD).count();
        format!("scheduler=service_quality saturated_entries={saturated}")
    }
}
