//! The pluggable scheduler: a closed set of named policies behind one
//! trait, chosen at startup by name (§4.7, §9 "Pluggable scheduler").

mod close_page;
mod fair;
mod fcfs;
mod fr_fcfs;
mod perf;
mod power_down;
mod service_quality;
mod stride;

pub use close_page::ClosePage;
pub use fair::Fair;
pub use fcfs::Fcfs;
pub use fr_fcfs::FrFcfs;
pub use perf::Perf;
pub use power_down::PowerDown;
pub use service_quality::ServiceQuality;
pub use stride::Stride;

use crate::controller::Controller;
use crate::request::{NextCommand, Operation};
use usimm_config::SimConfig;

/// A named, pluggable request-scheduling policy.
///
/// `schedule` is called once per DRAM tick per channel, after
/// `update_queue_commands` has refreshed every request's `next_command`/
/// `command_issuable` flags. A policy may issue at most one command (plus
/// optionally one auto-precharge) per call; everything it does must go
/// through the `Controller`'s `is_*_allowed`/`issue_*` gate, so a buggy
/// policy fails loudly (a `debug_assert!` panic) rather than corrupting
/// state.
pub trait SchedulerPolicy {
    fn init(&mut self, cfg: &SimConfig);
    fn schedule(&mut self, ctl: &mut Controller, channel: usize);
    fn report_stats(&self) -> String;
}

/// Instantiates a scheduler policy by its configured name.
#[must_use]
pub fn by_name(name: &str, num_channels: usize, num_threads: usize) -> Option<Box<dyn SchedulerPolicy>> {
    match name {
        "fcfs" => Some(Box::new(Fcfs::new(num_channels))),
        "close_page" | "closepage" => Some(Box::new(ClosePage::new(num_channels))),
        "fr_fcfs" | "frfcfs" => Some(Box::new(FrFcfs::new(num_channels))),
        "perf" => Some(Box::new(Perf::new(num_channels, num_threads))),
        "power_down" | "powerdown" => Some(Box::new(PowerDown::new(num_channels))),
        "stride" => Some(Box::new(Stride::new(num_channels, num_threads))),
        "fair" => Some(Box::new(Fair::new(num_channels, num_threads))),
        "service_quality" | "servicequality" | "tage" => {
            Some(Box::new(ServiceQuality::new(num_channels, num_threads)))
        }
        _ => None,
    }
}

/// Write-drain hysteresis watermarks. Fixed at 40/20 write-queue entries,
/// matching the reference scheduler's `HI_WM`/`LO_WM` `#define`s, which are
/// compile-time constants independent of `WQ_CAPACITY` (a separate,
/// unrelated config field). Not scaled by `PROCESSOR_CLK_MULTIPLIER`: that
/// multiplier converts DRAM-cycle timings into processor ticks, but these
/// are queue-depth counts, not cycle counts.
#[must_use]
pub fn watermarks(_cfg: &SimConfig) -> (usize, usize) {
    const HI_WM: usize = 40;
    const LO_WM: usize = 20;
    (HI_WM, LO_WM)
}

/// Updates a per-channel write-drain flag per §4.7's hysteresis: enter
/// drain when the write queue exceeds `hi_wm` or the read queue is empty,
/// leave drain once the write queue falls to `lo_wm` or below.
pub fn update_drain_flag(ctl: &Controller, channel: usize, draining: &mut bool) {
    let (hi_wm, lo_wm) = watermarks(ctl.cfg);
    let queues = &ctl.channels[channel].queues;
    if queues.write_len() > hi_wm || queues.read_len() == 0 {
        *draining = true;
    } else if queues.write_len() <= lo_wm {
        *draining = false;
    }
}

/// Issues the first issuable request in `channel`'s queue for `op`, in
/// arrival order. Returns `true` if something issued. Shared by every
/// FCFS-derived policy.
pub fn issue_first_issuable(ctl: &mut Controller, channel: usize, op: Operation) -> bool {
    let now = ctl.cycle;
    let len = ctl.channels[channel].queues.queue(op).len();
    for i in 0..len {
        let (next_command, issuable, rank, bank, row) = {
            let req = &ctl.channels[channel].queues.queue(op)[i];
            (req.next_command, req.command_issuable, req.decoded.rank, req.decoded.bank, req.decoded.row)
        };
        if !issuable {
            continue;
        }
        match next_command {
            NextCommand::Activate => ctl.issue_activate(channel, rank, bank, row, now),
            NextCommand::Precharge => ctl.issue_precharge(channel, rank, bank, now),
            NextCommand::ColRead => ctl.issue_col_read(channel, rank, bank, i, now, false),
            NextCommand::ColWrite => ctl.issue_col_write(channel, rank, bank, i, now, false),
            NextCommand::PowerUp => ctl.issue_powerup(channel, rank, now),
            NextCommand::Nop => continue,
        }
        return true;
    }
    false
}

/// Issues the first request anywhere in `channel` (reads first, then
/// writes, unless `writes_first`) whose `next_command` is a column access
/// (`ColRead`/`ColWrite`) and is currently issuable — the FR-FCFS "hit
/// scan" (§4.7).
pub fn issue_first_column_hit(ctl: &mut Controller, channel: usize, writes_first: bool) -> bool {
    let order = if writes_first { [Operation::Write, Operation::Read] } else { [Operation::Read, Operation::Write] };
    for op in order {
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
            match (op, next_command) {
                (Operation::Read, NextCommand::ColRead) => {
                    ctl.issue_col_read(channel, rank, bank, i, now, false);
                    return true;
                }
                (Operation::Write, NextCommand::ColWrite) => {
                    ctl.issue_col_write(channel, rank, bank, i, now, false);
                    return true;
                }
                _ => {}
            }
        }
    }
    false
}

/// FCFS fallback used by several policies: drain reads (or writes, while
/// draining) in arrival order, issuing the first issuable request.
pub fn fcfs_fallback(ctl: &mut Controller, channel: usize, draining: bool) -> bool {
    let order = if draining { [Operation::Write, Operation::Read] } else { [Operation::Read, Operation::Write] };
    for op in order {
        if issue_first_issuable(ctl, channel, op) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermarks_are_fixed_regardless_of_wq_capacity() {
        let mut cfg = SimConfig::default();
        cfg.wq_capacity = 8;
        assert_eq!(watermarks(&cfg), (40, 20));

        cfg.wq_capacity = 4096;
        assert_eq!(watermarks(&cfg), (40, 20));
    }
}
