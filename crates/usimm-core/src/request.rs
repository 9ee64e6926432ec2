//! Requests: the unit of work flowing through a channel's queues.

use crate::address::DecodedAddress;
use usimm_config::Ticks;

/// Read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// The next DDR primitive needed to make progress on a request, recomputed
/// every DRAM tick by `update_queue_commands` (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextCommand {
    #[default]
    Nop,
    Activate,
    Precharge,
    ColRead,
    ColWrite,
    PowerUp,
}

/// A scheduler's private annotation on a request, if its policy needs one.
/// Most policies leave this `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerTag {
    #[default]
    None,
    /// Stride policy: this request was a speculative prefetch, not a
    /// demand access.
    Prefetch,
    /// Service-quality policy: a priority ticket value, higher wins.
    Priority(u32),
}

/// One in-flight memory request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub address: u64,
    pub decoded: DecodedAddress,
    pub arrival: Ticks,
    pub dispatch: Option<Ticks>,
    pub completion: Option<Ticks>,
    pub thread_id: usize,
    pub op: Operation,
    /// ROB slot this request will write its completion time back into.
    pub slot: usize,
    /// Instruction PC; present for reads only.
    pub pc: Option<u64>,
    pub next_command: NextCommand,
    pub command_issuable: bool,
    pub served: bool,
    pub tag: SchedulerTag,
}

impl Request {
    #[must_use]
    pub fn new(
        address: u64,
        decoded: DecodedAddress,
        arrival: Ticks,
        thread_id: usize,
        op: Operation,
        slot: usize,
        pc: Option<u64>,
    ) -> Self {
        Self {
            address,
            decoded,
            arrival,
            dispatch: None,
            completion: None,
            thread_id,
            op,
            slot,
            pc,
            next_command: NextCommand::Nop,
            command_issuable: false,
            served: false,
            tag: SchedulerTag::None,
        }
    }
}
