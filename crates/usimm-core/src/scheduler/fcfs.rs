//! First-come-first-served: drain reads (or writes, under drain pressure)
//! strictly in arrival order.

use super::{fcfs_fallback, update_drain_flag, SchedulerPolicy};
use crate::controller::Controller;
use usimm_config::SimConfig;

pub struct Fcfs {
    draining: Vec<bool>,
}

impl Fcfs {
    #[must_use]
    pub fn new(num_channels: usize) -> Self {
        Self { draining: vec![false; num_channels] }
    }
}

impl SchedulerPolicy for Fcfs {
    fn init(&mut self, _cfg: &SimConfig) {}

    fn schedule(&mut self, ctl: &mut Controller, channel: usize) {
        update_drain_flag(ctl, channel, &mut self.draining[channel]);
        fcfs_fallback(ctl, channel, self.draining[channel]);
    }

    fn report_stats(&self) -> String {
        "scheduler=fcfs".to_string()
    }
}
