//! Per-channel state: its ranks and request queues.

use crate::queue::RequestQueues;
use crate::rank::Rank;
use usimm_config::Ticks;

#[derive(Debug, Clone)]
pub struct Channel {
    pub ranks: Vec<Rank>,
    pub queues: RequestQueues,
    /// Set once a command issues on this channel this DRAM tick; cleared at
    /// the start of the next tick. Enforces §8 invariant 1.
    pub command_issued_this_cycle: bool,
}

impl Channel {
    #[must_use]
    pub fn new(num_ranks: usize, num_banks: usize, t_refi: Ticks) -> Self {
        Self {
            ranks: (0..num_ranks).map(|_| Rank::new(num_banks, t_refi)).collect(),
            queues: RequestQueues::new(),
            command_issued_this_cycle: false,
        }
    }
}
