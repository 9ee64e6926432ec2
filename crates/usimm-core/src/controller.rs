//! The `Controller`: owns every piece of per-process mutable state and
//! drives one DRAM tick's worth of work (§4.5, §4.6, §4.9, §9 "Global
//! mutable state").

use crate::address::{self, DecodedAddress};
use crate::bank::BankState;
use crate::channel::Channel;
use crate::power::PowerModel;
use crate::queue::{self, ReadEnqueueOutcome, WriteEnqueueOutcome};
use crate::refresh::RefreshAction;
use crate::request::{NextCommand, Operation, Request};
use usimm_config::{SimConfig, Ticks};

/// Owns every channel, and by extension every rank and bank; the single
/// point through which the scheduler, issuer, and queue logic all act.
pub struct Controller<'cfg> {
    pub cfg: &'cfg SimConfig,
    /// Number of cores driving this run; augments the row address field
    /// per §4.1.
    pub num_cores: usize,
    /// `CYCLE_VAL`: the global processor-tick counter.
    pub cycle: Ticks,
    pub channels: Vec<Channel>,
    pub power: PowerModel,
}

impl<'cfg> Controller<'cfg> {
    #[must_use]
    pub fn new(cfg: &'cfg SimConfig, num_cores: usize) -> Self {
        let channels = (0..cfg.num_channels)
            .map(|_| Channel::new(cfg.num_ranks, cfg.num_banks, cfg.t_refi))
            .collect();
        Self { cfg, num_cores, cycle: Ticks::ZERO, channels, power: PowerModel::new() }
    }

    #[must_use]
    pub fn decode(&self, address: u64) -> DecodedAddress {
        address::decode(self.cfg, address, self.num_cores)
    }

    /// Attempts to enqueue a read. Returns the outcome so the caller (the
    /// tick loop) knows how to set the ROB completion time: on a hit, the
    /// caller adds `WQ_LOOKUP_LATENCY` or the 1-cycle read-hit latency
    /// itself; on `Enqueued`, completion is set later by the issuer.
    pub fn enqueue_read(
        &mut self,
        channel: usize,
        address: u64,
        arrival: Ticks,
        thread_id: usize,
        slot: usize,
        pc: u64,
    ) -> ReadEnqueueOutcome {
        let decoded = self.decode(address);
        let request = Request::new(address, decoded, arrival, thread_id, Operation::Read, slot, Some(pc));
        self.channels[channel].queues.enqueue_read(request)
    }

    /// Attempts to enqueue a write. The write is "posted": its ROB
    /// completion is set by the caller immediately regardless of outcome,
    /// since writes do not block retirement (§4.9).
    pub fn enqueue_write(
        &mut self,
        channel: usize,
        address: u64,
        arrival: Ticks,
        thread_id: usize,
        slot: usize,
    ) -> WriteEnqueueOutcome {
        let decoded = self.decode(address);
        let request = Request::new(address, decoded, arrival, thread_id, Operation::Write, slot, None);
        self.channels[channel].queues.enqueue_write(request, self.cfg.wq_capacity)
    }

    /// Runs the refresh governor for every rank and force-issues any
    /// refresh it demands (§4.5). Must run before `update_queue_commands`
    /// each DRAM tick.
    pub fn refresh_update(&mut self) {
        let now = self.cycle;
        let t_refi = self.cfg.t_refi;
        let t_rp = self.cfg.t_rp;
        let t_rfc = self.cfg.t_rfc;
        for channel in 0..self.channels.len() {
            for rank in 0..self.channels[channel].ranks.len() {
                let action = self.channels[channel].ranks[rank].refresh.tick(now, t_refi, t_rp, t_rfc);
                if action == RefreshAction::ForceRefreshAll {
                    self.force_issue_refresh(channel, rank, now);
                }
            }
        }
    }

    /// Recomputes `next_command`/`command_issuable` for every queued
    /// request on `channel` (§4.6).
    pub fn update_queue_commands(&mut self, channel: usize) {
        let now = self.cycle;
        queue::reset_commands(&mut self.channels[channel].queues);

        for op in [Operation::Read, Operation::Write] {
            let len = self.channels[channel].queues.queue(op).len();
            for i in 0..len {
                let (rank, bank, row) = {
                    let req = &self.channels[channel].queues.queue(op)[i];
                    (req.decoded.rank, req.decoded.bank, req.decoded.row)
                };
                let bank_state = self.channels[channel].ranks[rank].banks[bank].state;
                let row_open = self.channels[channel].ranks[rank].banks[bank].active_row == Some(row);

                let (next_command, issuable) = match bank_state {
                    BankState::RowActive if row_open => match op {
                        Operation::Read => {
                            (NextCommand::ColRead, self.is_col_read_allowed(channel, rank, bank, now))
                        }
                        Operation::Write => {
                            (NextCommand::ColWrite, self.is_col_write_allowed(channel, rank, bank, now))
                        }
                    },
                    BankState::RowActive => {
                        (NextCommand::Precharge, self.is_precharge_allowed(channel, rank, bank, now))
                    }
                    BankState::Idle | BankState::Precharging | BankState::Refreshing => {
                        (NextCommand::Activate, self.is_activate_allowed(channel, rank, bank, now))
                    }
                    BankState::PrechargePowerDownSlow
                    | BankState::PrechargePowerDownFast
                    | BankState::ActivePowerDown => {
                        (NextCommand::PowerUp, self.is_powerup_allowed(channel, rank, now))
                    }
                };

                let req = &mut self.channels[channel].queues.queue_mut(op)[i];
                req.next_command = next_command;
                req.command_issuable = issuable;
            }
        }
    }

    /// Removes served requests and returns `(thread_id, slot, completion,
    /// op)` for each, so the caller can write back into the ROB (reads
    /// only; see `RequestQueues::drain_served`).
    pub fn cleanup(&mut self, channel: usize) -> Vec<(usize, usize, Ticks, Operation)> {
        self.channels[channel].queues.drain_served()
    }

    /// Clears the per-channel one-command-per-cycle latch; call once at the
    /// start of each DRAM tick, before `refresh_update`.
    pub fn begin_dram_tick(&mut self) {
        for ch in &mut self.channels {
            ch.command_issued_this_cycle = false;
        }
    }

    /// Accumulates this DRAM tick's state-occupancy counters into the
    /// power model (§4.8). Call once per DRAM tick, after the scheduler has
    /// run for every channel.
    pub fn accumulate_power_occupancy(&mut self) {
        let dram_tick = self.cfg.processor_clk_multiplier;
        for (ch_idx, ch) in self.channels.iter().enumerate() {
            for (rk_idx, rk) in ch.ranks.iter().enumerate() {
                self.power.observe_occupancy(ch_idx, rk_idx, rk, dram_tick);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_bank_config() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.t_rcd = Ticks::new(10);
        cfg.t_rp = Ticks::new(10);
        cfg.t_cas = Ticks::new(10);
        cfg.t_ras = Ticks::new(30);
        cfg.t_rc = Ticks::new(40);
        cfg.t_data_trans = Ticks::new(4);
        cfg
    }

    #[test]
    fn enqueue_read_then_decode_targets_bank_zero() {
        let cfg = single_bank_config();
        let mut ctl = Controller::new(&cfg, 1);
        let outcome = ctl.enqueue_read(0, 0x40, Ticks::ZERO, 0, 0, 0x1000);
        assert_eq!(outcome, ReadEnqueueOutcome::Enqueued);
        assert_eq!(ctl.channels[0].queues.read_len(), 1);
        assert_eq!(ctl.channels[0].queues.reads[0].decoded.bank, 0);
    }

    #[test]
    fn update_queue_commands_flags_activate_for_fresh_bank() {
        let cfg = single_bank_config();
        let mut ctl = Controller::new(&cfg, 1);
        ctl.enqueue_read(0, 0x40, Ticks::ZERO, 0, 0, 0x1000);
        ctl.update_queue_commands(0);
        let req = &ctl.channels[0].queues.reads[0];
        assert_eq!(req.next_command, NextCommand::Activate);
        assert!(req.command_issuable);
    }
}
