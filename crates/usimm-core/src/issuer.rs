//! The command issuer: precondition checks and state mutation for every
//! DDR command kind (§4.3, §4.4).
//!
//! Every `is_*_allowed` is a pure read of current state; every `issue_*`
//! re-checks its own precondition with a `debug_assert!` (an issuer call
//! against a command flagged not-issuable is an invariant violation, per
//! §7) and then mutates atomically — either every field updates or (on the
//! assertion) the process panics before anything changes.

use crate::bank::BankState;
use crate::controller::Controller;
use usimm_config::Ticks;

impl Controller<'_> {
    /// Common eligibility gate shared by every command kind (§4.4): no
    /// command already issued this cycle on the channel, the rank is not in
    /// forced-refresh mode, and the candidate command's worst-case
    /// completion would not cross the rank's refresh issue deadline.
    fn gate(&self, channel: usize, rank: usize, now: Ticks, worst_case_delay: Ticks) -> bool {
        let ch = &self.channels[channel];
        if ch.command_issued_this_cycle {
            return false;
        }
        let rk = &ch.ranks[rank];
        if rk.refresh.forced {
            return false;
        }
        now.saturating_add(worst_case_delay) <= rk.refresh.issue_deadline
    }

    fn mark_issued(&mut self, channel: usize) {
        self.channels[channel].command_issued_this_cycle = true;
    }

    // ---- ACT --------------------------------------------------------

    #[must_use]
    pub fn is_activate_allowed(&self, channel: usize, rank: usize, bank: usize, now: Ticks) -> bool {
        let ch = &self.channels[channel];
        let rk = &ch.ranks[rank];
        let bk = &rk.banks[bank];
        matches!(bk.state, BankState::Idle | BankState::Precharging | BankState::Refreshing)
            && now >= bk.next_act
            && rk.faw.clone().can_activate(now, self.cfg.t_faw)
            && self.gate(channel, rank, now, self.cfg.t_ras)
    }

    pub fn issue_activate(&mut self, channel: usize, rank: usize, bank: usize, row: usize, now: Ticks) {
        debug_assert!(
            self.is_activate_allowed(channel, rank, bank, now),
            "issue_activate called on a non-issuable ACT at cycle {now:?} (channel {channel}, rank {rank}, bank {bank})"
        );
        let t_rc = self.cfg.t_rc;
        let t_rcd = self.cfg.t_rcd;
        let t_ras = self.cfg.t_ras;
        let t_rrd = self.cfg.t_rrd;
        let t_faw = self.cfg.t_faw;

        let ch = &mut self.channels[channel];
        let rk = &mut ch.ranks[rank];
        {
            let bk = &mut rk.banks[bank];
            bk.state = BankState::RowActive;
            bk.active_row = Some(row);
            bk.next_pre = bk.next_pre.max(now + t_ras);
            bk.next_read = bk.next_read.max(now + t_rcd);
            bk.next_write = bk.next_write.max(now + t_rcd);
            bk.next_act = bk.next_act.max(now + t_rc);
        }
        for (idx, other) in rk.banks.iter_mut().enumerate() {
            if idx != bank {
                other.next_act = other.next_act.max(now + t_rrd);
            }
        }
        rk.faw.record_activate(now, t_faw);
        self.mark_issued(channel);
        self.power.record_activate(channel, rank);
    }

    // ---- COL_READ -----------------------------------------------------

    #[must_use]
    pub fn is_col_read_allowed(&self, channel: usize, rank: usize, bank: usize, now: Ticks) -> bool {
        let ch = &self.channels[channel];
        let bk = &ch.ranks[rank].banks[bank];
        bk.state == BankState::RowActive
            && now >= bk.next_read
            && self.gate(channel, rank, now, self.cfg.t_cas + self.cfg.t_data_trans)
    }

    /// Issues a COL_READ against `bank`, and sets `completion`/`served` on
    /// the request found at `queue_index` in the channel's read queue.
    pub fn issue_col_read(
        &mut self,
        channel: usize,
        rank: usize,
        bank: usize,
        queue_index: usize,
        now: Ticks,
        auto_precharge: bool,
    ) {
        debug_assert!(
            self.is_col_read_allowed(channel, rank, bank, now),
            "issue_col_read called on a non-issuable COL_READ at cycle {now:?} (channel {channel}, rank {rank}, bank {bank})"
        );
        let cfg = self.cfg;
        let t_cas = cfg.t_cas;
        let t_data_trans = cfg.t_data_trans;
        let t_ccd = cfg.t_ccd;
        let t_rtrs = cfg.t_rtrs;
        let t_cwd = cfg.t_cwd;
        let t_rtp = cfg.t_rtp;
        let completion = now + t_cas + t_data_trans;

        {
            let num_ranks = self.channels[channel].ranks.len();
            let ch = &mut self.channels[channel];
            for r in 0..num_ranks {
                for (idx, bk) in ch.ranks[r].banks.iter_mut().enumerate() {
                    if r == rank {
                        if idx == bank {
                            bk.next_pre = bk.next_pre.max(now + t_rtp);
                            bk.next_read = bk.next_read.max(now + t_ccd.max(t_data_trans));
                            bk.consecutive_hits += 1;
                        } else {
                            bk.next_read = bk.next_read.max(now + t_ccd.max(t_data_trans));
                        }
                    } else {
                        bk.next_read = bk.next_read.max(now + t_data_trans + t_rtrs);
                    }
                    let write_delay = (t_cas + t_data_trans + t_rtrs).saturating_sub(t_cwd);
                    bk.next_write = bk.next_write.max(now + write_delay);
                }
            }
        }

        let req = &mut self.channels[channel].queues.reads[queue_index];
        req.dispatch = Some(now);
        req.completion = Some(completion);
        req.served = true;
        self.mark_issued(channel);
        self.power.record_read(channel, rank);

        if auto_precharge && self.is_auto_precharge_allowed_after_read(channel, rank, bank, now) {
            self.apply_auto_precharge_read(channel, rank, bank, now);
        }
    }

    // ---- COL_WRITE ------------------------------------------------------

    #[must_use]
    pub fn is_col_write_allowed(&self, channel: usize, rank: usize, bank: usize, now: Ticks) -> bool {
        let ch = &self.channels[channel];
        let bk = &ch.ranks[rank].banks[bank];
        bk.state == BankState::RowActive
            && now >= bk.next_write
            && self.gate(channel, rank, now, self.cfg.t_data_trans + self.cfg.t_wr)
    }

    pub fn issue_col_write(
        &mut self,
        channel: usize,
        rank: usize,
        bank: usize,
        queue_index: usize,
        now: Ticks,
        auto_precharge: bool,
    ) {
        debug_assert!(
            self.is_col_write_allowed(channel, rank, bank, now),
            "issue_col_write called on a non-issuable COL_WRITE at cycle {now:?} (channel {channel}, rank {rank}, bank {bank})"
        );
        let cfg = self.cfg;
        let t_cwd = cfg.t_cwd;
        let t_data_trans = cfg.t_data_trans;
        let t_wr = cfg.t_wr;
        let t_ccd = cfg.t_ccd;
        let t_rtrs = cfg.t_rtrs;
        let t_wtr = cfg.t_wtr;
        let t_cas = cfg.t_cas;
        let completion = now + t_data_trans + t_wr;

        {
            let num_ranks = self.channels[channel].ranks.len();
            let ch = &mut self.channels[channel];
            for r in 0..num_ranks {
                for (idx, bk) in ch.ranks[r].banks.iter_mut().enumerate() {
                    if r == rank {
                        if idx == bank {
                            bk.next_pre = bk.next_pre.max(now + t_cwd + t_data_trans + t_wr);
                            bk.next_write = bk.next_write.max(now + t_ccd.max(t_data_trans));
                            bk.consecutive_hits += 1;
                        } else {
                            bk.next_write = bk.next_write.max(now + t_ccd.max(t_data_trans));
                        }
                        bk.next_read = bk.next_read.max(now + t_cwd + t_data_trans + t_wtr);
                    } else {
                        bk.next_write = bk.next_write.max(now + t_data_trans + t_rtrs);
                        let read_delay = (t_cwd + t_data_trans + t_rtrs).saturating_sub(t_cas);
                        bk.next_read = bk.next_read.max(now + read_delay);
                    }
                }
            }
        }

        let req = &mut self.channels[channel].queues.writes[queue_index];
        req.dispatch = Some(now);
        req.completion = Some(completion);
        req.served = true;
        self.mark_issued(channel);
        self.power.record_write(channel, rank);

        if auto_precharge && self.is_auto_precharge_allowed_after_write(channel, rank, bank, now) {
            self.apply_auto_precharge_write(channel, rank, bank, now);
        }
    }

    // ---- auto-precharge -------------------------------------------------

    /// Whether auto-precharge is allowed following a COL_READ issued at
    /// `now` (§4.3): the bank must be able to start precharging by
    /// `start_pre` and still finish before the rank's refresh deadline.
    #[must_use]
    pub fn is_auto_precharge_allowed_after_read(&self, channel: usize, rank: usize, bank: usize, now: Ticks) -> bool {
        let bk = &self.channels[channel].ranks[rank].banks[bank];
        let start_pre = (now + self.cfg.t_rtp).max(bk.next_pre);
        start_pre + self.cfg.t_rp <= self.channels[channel].ranks[rank].refresh.issue_deadline
    }

    #[must_use]
    pub fn is_auto_precharge_allowed_after_write(&self, channel: usize, rank: usize, bank: usize, now: Ticks) -> bool {
        let bk = &self.channels[channel].ranks[rank].banks[bank];
        let start_pre = (now + self.cfg.t_cwd + self.cfg.t_data_trans + self.cfg.t_wr).max(bk.next_pre);
        start_pre + self.cfg.t_rp <= self.channels[channel].ranks[rank].refresh.issue_deadline
    }

    fn apply_auto_precharge_read(&mut self, channel: usize, rank: usize, bank: usize, now: Ticks) {
        let bk = &self.channels[channel].ranks[rank].banks[bank];
        let start_pre = (now + self.cfg.t_rtp).max(bk.next_pre);
        self.schedule_precharge_at(channel, rank, bank, start_pre);
    }

    fn apply_auto_precharge_write(&mut self, channel: usize, rank: usize, bank: usize, now: Ticks) {
        let bk = &self.channels[channel].ranks[rank].banks[bank];
        let start_pre = (now + self.cfg.t_cwd + self.cfg.t_data_trans + self.cfg.t_wr).max(bk.next_pre);
        self.schedule_precharge_at(channel, rank, bank, start_pre);
    }

    /// Auto-precharge does not issue a PRE command through the normal
    /// one-per-cycle gate (it is a modifier on the COL_* that already
    /// consumed this cycle's slot); it simply schedules the bank's
    /// transition to `PRECHARGING` at `start_pre + tRP` and resets its
    /// counters as a normal PRE would at that future cycle. Since this
    /// implementation is cycle-driven by explicit `issue_precharge` calls
    /// rather than a deferred-event queue, auto-precharge is realized by
    /// immediately pushing the bank's `next_*` floors out to that future
    /// completion, which has the same observable effect on `is_*_allowed`
    /// checks between `now` and `start_pre + tRP`.
    fn schedule_precharge_at(&mut self, channel: usize, rank: usize, bank: usize, start_pre: Ticks) {
        let t_rp = self.cfg.t_rp;
        let bk = &mut self.channels[channel].ranks[rank].banks[bank];
        bk.next_act = bk.next_act.max(start_pre + t_rp);
        bk.next_pre = bk.next_pre.max(start_pre + t_rp);
        bk.next_refresh = bk.next_refresh.max(start_pre + t_rp);
        bk.next_powerdown = bk.next_powerdown.max(start_pre + t_rp);
        bk.state = BankState::Precharging;
        bk.active_row = None;
        bk.consecutive_hits = 0;
    }

    // ---- PRE --------------------------------------------------------

    #[must_use]
    pub fn is_precharge_allowed(&self, channel: usize, rank: usize, bank: usize, now: Ticks) -> bool {
        let bk = &self.channels[channel].ranks[rank].banks[bank];
        !bk.state.is_powered_down() && now >= bk.next_pre && self.gate(channel, rank, now, self.cfg.t_rp)
    }

    pub fn issue_precharge(&mut self, channel: usize, rank: usize, bank: usize, now: Ticks) {
        debug_assert!(
            self.is_precharge_allowed(channel, rank, bank, now),
            "issue_precharge called on a non-issuable PRE at cycle {now:?} (channel {channel}, rank {rank}, bank {bank})"
        );
        let t_rp = self.cfg.t_rp;
        let bk = &mut self.channels[channel].ranks[rank].banks[bank];
        bk.state = BankState::Precharging;
        bk.active_row = None;
        bk.consecutive_hits = 0;
        bk.next_act = bk.next_act.max(now + t_rp);
        bk.next_pre = bk.next_pre.max(now + t_rp);
        bk.next_refresh = bk.next_refresh.max(now + t_rp);
        bk.next_powerdown = bk.next_powerdown.max(now + t_rp);
        self.mark_issued(channel);
    }

    #[must_use]
    pub fn is_all_bank_precharge_allowed(&self, channel: usize, rank: usize, now: Ticks) -> bool {
        (0..self.channels[channel].ranks[rank].banks.len())
            .all(|b| self.is_precharge_allowed(channel, rank, b, now))
    }

    pub fn issue_all_bank_precharge(&mut self, channel: usize, rank: usize, now: Ticks) {
        debug_assert!(
            self.is_all_bank_precharge_allowed(channel, rank, now),
            "issue_all_bank_precharge called when not every bank could precharge at {now:?}"
        );
        let t_rp = self.cfg.t_rp;
        let num_banks = self.channels[channel].ranks[rank].banks.len();
        for bk in &mut self.channels[channel].ranks[rank].banks {
            bk.state = BankState::Precharging;
            bk.active_row = None;
            bk.consecutive_hits = 0;
            bk.next_act = bk.next_act.max(now + t_rp);
            bk.next_pre = bk.next_pre.max(now + t_rp);
            bk.next_refresh = bk.next_refresh.max(now + t_rp);
            bk.next_powerdown = bk.next_powerdown.max(now + t_rp);
        }
        let _ = num_banks;
        self.mark_issued(channel);
    }

    // ---- REF --------------------------------------------------------

    #[must_use]
    pub fn is_refresh_allowed(&self, channel: usize, rank: usize, now: Ticks) -> bool {
        let rk = &self.channels[channel].ranks[rank];
        rk.banks.iter().all(|b| !b.state.is_powered_down())
            && rk.refresh.num_issued < 8
            && self.gate(channel, rank, now, self.cfg.t_rfc)
    }

    /// Issues a normal (scheduler-requested) refresh on every bank of the
    /// rank, counting once against the rank's budget.
    pub fn issue_refresh(&mut self, channel: usize, rank: usize, now: Ticks) {
        debug_assert!(
            self.is_refresh_allowed(channel, rank, now),
            "issue_refresh called on a non-issuable REF at cycle {now:?} (channel {channel}, rank {rank})"
        );
        self.apply_refresh(channel, rank, now, false);
        self.mark_issued(channel);
    }

    /// Force-issues refresh on every bank of the rank, bypassing the normal
    /// gate entirely (§4.5 step 2): preempts any queued command and does
    /// not consume the channel's one-command-per-cycle slot, since it is
    /// the refresh governor overriding the scheduler, not the scheduler
    /// itself issuing a command. Drains the rank's entire remaining budget
    /// at once, since `tick()` only fires this once per window at
    /// `issue_deadline` and `num_issued` must reach 8 by the completion
    /// deadline.
    pub fn force_issue_refresh(&mut self, channel: usize, rank: usize, now: Ticks) {
        self.apply_refresh(channel, rank, now, true);
    }

    fn apply_refresh(&mut self, channel: usize, rank: usize, now: Ticks, forced: bool) {
        let t_rfc = self.cfg.t_rfc;
        let t_rp = self.cfg.t_rp;
        let deadline = self.channels[channel].ranks[rank].refresh.next_completion_deadline;
        for bk in &mut self.channels[channel].ranks[rank].banks {
            bk.state = BankState::Refreshing;
            bk.active_row = None;
            bk.consecutive_hits = 0;
            let target = deadline.max(now + t_rfc);
            bk.next_act = bk.next_act.max(target);
            bk.next_pre = bk.next_pre.max(target);
            bk.next_read = bk.next_read.max(target);
            bk.next_write = bk.next_write.max(target);
            bk.next_powerdown = bk.next_powerdown.max(target);
            bk.next_powerup = bk.next_powerup.max(target);
            bk.next_refresh = bk.next_refresh.max(target);
        }
        if forced {
            self.channels[channel].ranks[rank].refresh.record_forced_refresh_burst(t_rp, t_rfc);
        } else {
            self.channels[channel].ranks[rank].refresh.record_refresh_issued(t_rp, t_rfc);
        }
        self.power.record_refresh(channel, rank);
    }

    // ---- PWR_DN / PWR_UP --------------------------------------------

    #[must_use]
    pub fn is_powerdown_fast_allowed(&self, channel: usize, rank: usize, now: Ticks) -> bool {
        let rk = &self.channels[channel].ranks[rank];
        rk.banks.iter().all(|b| {
            now >= b.next_powerdown
                && matches!(
                    b.state,
                    BankState::Idle | BankState::Precharging | BankState::Refreshing | BankState::RowActive
                )
        }) && self.gate(channel, rank, now, self.cfg.t_pd_min)
    }

    #[must_use]
    pub fn is_powerdown_slow_allowed(&self, channel: usize, rank: usize, now: Ticks) -> bool {
        let rk = &self.channels[channel].ranks[rank];
        rk.banks.iter().all(|b| {
            now >= b.next_powerdown
                && matches!(b.state, BankState::Idle | BankState::Precharging | BankState::Refreshing)
        }) && self.gate(channel, rank, now, self.cfg.t_pd_min)
    }

    pub fn issue_powerdown(&mut self, channel: usize, rank: usize, now: Ticks, fast: bool) {
        debug_assert!(
            if fast {
                self.is_powerdown_fast_allowed(channel, rank, now)
            } else {
                self.is_powerdown_slow_allowed(channel, rank, now)
            },
            "issue_powerdown called on a non-issuable PWR_DN at cycle {now:?} (channel {channel}, rank {rank}, fast {fast})"
        );
        let t_pd_min = self.cfg.t_pd_min;
        for bk in &mut self.channels[channel].ranks[rank].banks {
            bk.state = match bk.state {
                BankState::RowActive if fast => BankState::ActivePowerDown,
                _ => {
                    if fast {
                        BankState::PrechargePowerDownFast
                    } else {
                        BankState::PrechargePowerDownSlow
                    }
                }
            };
            bk.next_powerup = bk.next_powerup.max(now + t_pd_min);
        }
        self.mark_issued(channel);
    }

    #[must_use]
    pub fn is_powerup_allowed(&self, channel: usize, rank: usize, now: Ticks) -> bool {
        let rk = &self.channels[channel].ranks[rank];
        rk.banks.iter().all(|b| now >= b.next_powerup && b.state.is_powered_down())
            && self.gate(channel, rank, now, self.cfg.t_xp_dll.max(self.cfg.t_xp))
    }

    pub fn issue_powerup(&mut self, channel: usize, rank: usize, now: Ticks) {
        debug_assert!(
            self.is_powerup_allowed(channel, rank, now),
            "issue_powerup called on a non-issuable PWR_UP at cycle {now:?} (channel {channel}, rank {rank})"
        );
        let t_xp = self.cfg.t_xp;
        let t_xp_dll = self.cfg.t_xp_dll;
        for bk in &mut self.channels[channel].ranks[rank].banks {
            let delay = if bk.state == BankState::PrechargePowerDownSlow { t_xp_dll } else { t_xp };
            bk.state = match bk.state {
                BankState::ActivePowerDown => BankState::RowActive,
                _ => BankState::Idle,
            };
            let target = now + delay;
            bk.next_act = bk.next_act.max(target);
            bk.next_pre = bk.next_pre.max(target);
            bk.next_read = bk.next_read.max(target);
            bk.next_write = bk.next_write.max(target);
            bk.next_powerdown = bk.next_powerdown.max(target);
            bk.next_refresh = bk.next_refresh.max(target);
        }
        self.mark_issued(channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usimm_config::SimConfig;

    /// §8 scenario S1: tRCD=tRP=tCAS=10, tRAS=30, tRC=40, tDATA_TRANS=4,
    /// everything else zero, one channel/rank/bank.
    fn s1_config() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.t_rcd = Ticks::new(10);
        cfg.t_rp = Ticks::new(10);
        cfg.t_cas = Ticks::new(10);
        cfg.t_ras = Ticks::new(30);
        cfg.t_rc = Ticks::new(40);
        cfg.t_data_trans = Ticks::new(4);
        cfg.t_refi = Ticks::new(1_000_000);
        cfg
    }

    #[test]
    fn s1_single_read_row_hit_sequence() {
        let cfg = s1_config();
        let mut ctl = Controller::new(&cfg, 1);

        // Three reads to the same row, distinct columns (cache_line_size
        // 64 apart keeps them in the same row with this default topology).
        for (i, addr) in [0u64, 64, 128].into_iter().enumerate() {
            ctl.enqueue_read(0, addr, Ticks::ZERO, 0, i, 0x1000);
        }

        assert!(ctl.is_activate_allowed(0, 0, 0, Ticks::ZERO));
        ctl.issue_activate(0, 0, 0, 0, Ticks::ZERO);
        assert_eq!(ctl.channels[0].ranks[0].banks[0].next_read, Ticks::new(10));

        let first_legal = ctl.channels[0].ranks[0].banks[0].next_read;
        assert!(ctl.is_col_read_allowed(0, 0, 0, first_legal));
        ctl.issue_col_read(0, 0, 0, 0, first_legal, false);
        let first_completion = ctl.channels[0].queues.reads[0].completion.unwrap();
        assert_eq!(first_completion, first_legal + cfg.t_cas + cfg.t_data_trans);
        assert_eq!(first_completion, Ticks::ZERO + cfg.t_rcd + cfg.t_cas + cfg.t_data_trans);

        let second_legal = ctl.channels[0].ranks[0].banks[0].next_read;
        assert_eq!(second_legal, first_legal + cfg.t_ccd.max(cfg.t_data_trans));
        assert!(ctl.is_col_read_allowed(0, 0, 0, second_legal));
        ctl.issue_col_read(0, 0, 0, 1, second_legal, false);
        let second_completion = ctl.channels[0].queues.reads[1].completion.unwrap();
        assert_eq!(second_completion, first_completion + cfg.t_ccd.max(cfg.t_data_trans));

        let third_legal = ctl.channels[0].ranks[0].banks[0].next_read;
        assert_eq!(third_legal, second_legal + cfg.t_ccd.max(cfg.t_data_trans));
        assert!(ctl.is_col_read_allowed(0, 0, 0, third_legal));
        ctl.issue_col_read(0, 0, 0, 2, third_legal, false);
        let third_completion = ctl.channels[0].queues.reads[2].completion.unwrap();
        assert_eq!(third_completion, second_completion + cfg.t_ccd.max(cfg.t_data_trans));
    }

    /// §8 scenario S2: a row conflict forces ACT, COL_READ, PRE, ACT,
    /// COL_READ; the second completion trails the first ACT by at least
    /// tRAS+tRP+tRCD+tCAS+tDATA_TRANS.
    #[test]
    fn s2_row_conflict_sequence() {
        let cfg = s1_config();
        let mut ctl = Controller::new(&cfg, 1);

        ctl.issue_activate(0, 0, 0, 0, Ticks::ZERO);
        let read_legal = ctl.channels[0].ranks[0].banks[0].next_read;
        ctl.enqueue_read(0, 0, Ticks::ZERO, 0, 0, 0x1000);
        ctl.issue_col_read(0, 0, 0, 0, read_legal, false);

        let pre_legal = ctl.channels[0].ranks[0].banks[0].next_pre;
        assert!(ctl.is_precharge_allowed(0, 0, 0, pre_legal));
        ctl.issue_precharge(0, 0, 0, pre_legal);
        assert_eq!(ctl.channels[0].ranks[0].banks[0].active_row, None);

        let act2_legal = ctl.channels[0].ranks[0].banks[0].next_act;
        assert!(ctl.is_activate_allowed(0, 0, 0, act2_legal));
        ctl.issue_activate(0, 0, 0, 1, act2_legal);

        let read2_legal = ctl.channels[0].ranks[0].banks[0].next_read;
        ctl.enqueue_read(0, 1 << 20, Ticks::ZERO, 0, 1, 0x1004);
        ctl.issue_col_read(0, 0, 0, 1, read2_legal, false);
        let second_completion = ctl.channels[0].queues.reads[1].completion.unwrap();

        let min_gap = cfg.t_ras + cfg.t_rp + cfg.t_rcd + cfg.t_cas + cfg.t_data_trans;
        assert!(second_completion.get() >= min_gap.get());
    }

    /// §8 scenario S5: a fifth activation to a distinct bank on the same
    /// rank within tFAW is delayed until the oldest activation ages out.
    #[test]
    fn s5_faw_saturation_delays_fifth_activation() {
        let mut cfg = s1_config();
        cfg.num_banks = 5;
        cfg.t_faw = Ticks::new(20);
        cfg.t_rrd = Ticks::ZERO;
        let mut ctl = Controller::new(&cfg, 1);

        for (bank, t) in [(0, 0u64), (1, 5), (2, 10), (3, 15)] {
            let now = Ticks::new(t);
            assert!(ctl.is_activate_allowed(0, 0, bank, now), "ACT on bank {bank} at {t} should be legal");
            ctl.issue_activate(0, 0, bank, 0, now);
        }

        // A 5th ACT within the rolling tFAW window (4 already recorded) must
        // be rejected purely on FAW grounds.
        assert!(!ctl.is_activate_allowed(0, 0, 4, Ticks::new(16)));

        // Once the oldest activation (cycle 0) ages out of the tFAW window,
        // the 5th bank's activation becomes legal again.
        assert!(ctl.is_activate_allowed(0, 0, 4, Ticks::new(21)));
    }

    /// §8 scenario S6: driving the rank to its refresh issue deadline with
    /// refreshes still outstanding forces refresh on every bank and blocks
    /// column access until the forced interval clears.
    #[test]
    fn s6_forced_refresh_blocks_column_access() {
        let mut cfg = s1_config();
        cfg.t_refi = Ticks::new(1000);
        cfg.t_rfc = Ticks::new(50);
        let mut ctl = Controller::new(&cfg, 1);

        ctl.issue_activate(0, 0, 0, 0, Ticks::ZERO);
        // One tick at cycle 0 lets the governor recompute its issue
        // deadline from the real tRP/tRFC (its constructor seeds a
        // placeholder using zero for both, corrected on first use).
        ctl.refresh_update();
        let issue_deadline = ctl.channels[0].ranks[0].refresh.issue_deadline;
        ctl.cycle = issue_deadline;

        ctl.refresh_update();

        assert!(ctl.channels[0].ranks[0].refresh.forced);
        assert_eq!(ctl.channels[0].ranks[0].banks[0].active_row, None);
        assert!(matches!(ctl.channels[0].ranks[0].banks[0].state, BankState::Refreshing));
        assert!(!ctl.is_col_read_allowed(0, 0, 0, issue_deadline));

        let deadline = ctl.channels[0].ranks[0].refresh.next_completion_deadline;
        assert_eq!(ctl.channels[0].ranks[0].refresh.num_issued, 8);
        assert!(ctl.channels[0].ranks[0].banks[0].next_act.get() >= deadline.get());
    }

    #[test]
    fn col_read_resets_consecutive_hits_is_not_reset_by_itself() {
        let cfg = s1_config();
        let mut ctl = Controller::new(&cfg, 1);
        ctl.issue_activate(0, 0, 0, 0, Ticks::ZERO);
        ctl.enqueue_read(0, 0, Ticks::ZERO, 0, 0, 0x1000);
        let legal = ctl.channels[0].ranks[0].banks[0].next_read;
        ctl.issue_col_read(0, 0, 0, 0, legal, false);
        assert_eq!(ctl.channels[0].ranks[0].banks[0].consecutive_hits, 1);
    }

    #[test]
    fn auto_precharge_resets_consecutive_hits() {
        let cfg = s1_config();
        let mut ctl = Controller::new(&cfg, 1);
        ctl.issue_activate(0, 0, 0, 0, Ticks::ZERO);
        ctl.enqueue_read(0, 0, Ticks::ZERO, 0, 0, 0x1000);
        let legal = ctl.channels[0].ranks[0].banks[0].next_read;
        ctl.issue_col_read(0, 0, 0, 0, legal, true);
        assert_eq!(ctl.channels[0].ranks[0].banks[0].consecutive_hits, 0);
        assert_eq!(ctl.channels[0].ranks[0].banks[0].state, BankState::Precharging);
    }
}
