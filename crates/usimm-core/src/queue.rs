//! Per-channel read/write queues: arrival-ordered, with merge-on-insert.

use crate::request::{NextCommand, Operation, Request};
use std::collections::VecDeque;
use usimm_config::Ticks;

/// Outcome of trying to enqueue a read (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEnqueueOutcome {
    /// The address matched a pending write; answered in `WQ_LOOKUP_LATENCY`
    /// cycles without entering the read queue.
    WriteQueueHit,
    /// The address matched a request already in the read queue; answered
    /// in the fixed 1-cycle read-queue-hit latency.
    ReadQueueHit,
    /// No match; the request was appended to the read queue's tail.
    Enqueued,
}

/// Outcome of trying to enqueue a write (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEnqueueOutcome {
    /// The address already existed in the write queue; coalesced, queue
    /// length unchanged.
    Coalesced,
    /// No match; the request was appended to the write queue's tail.
    Enqueued,
    /// The write queue is at `WQ_CAPACITY`; the caller must stall fetch for
    /// this channel.
    QueueFull,
}

/// One channel's ordered read and write queues.
#[derive(Debug, Clone, Default)]
pub struct RequestQueues {
    pub reads: VecDeque<Request>,
    pub writes: VecDeque<Request>,
    pub reads_merged: u64,
    pub writes_merged: u64,
}

impl RequestQueues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to enqueue `candidate` as a read. The candidate is only
    /// actually pushed onto `self.reads` when the outcome is `Enqueued`.
    pub fn enqueue_read(&mut self, candidate: Request) -> ReadEnqueueOutcome {
        if self.writes.iter().any(|w| w.address == candidate.address) {
            self.reads_merged += 1;
            return ReadEnqueueOutcome::WriteQueueHit;
        }
        if self.reads.iter().any(|r| r.address == candidate.address) {
            self.reads_merged += 1;
            return ReadEnqueueOutcome::ReadQueueHit;
        }
        self.reads.push_back(candidate);
        ReadEnqueueOutcome::Enqueued
    }

    /// Attempts to enqueue `candidate` as a write, respecting `capacity`
    /// (§8 invariant 7).
    pub fn enqueue_write(&mut self, candidate: Request, capacity: usize) -> WriteEnqueueOutcome {
        if self.writes.iter().any(|w| w.address == candidate.address) {
            self.writes_merged += 1;
            return WriteEnqueueOutcome::Coalesced;
        }
        if self.writes.len() >= capacity {
            return WriteEnqueueOutcome::QueueFull;
        }
        self.writes.push_back(candidate);
        WriteEnqueueOutcome::Enqueued
    }

    /// True iff a read for `address` would currently hit a pending write.
    #[must_use]
    pub fn write_queue_contains(&self, address: u64) -> bool {
        self.writes.iter().any(|w| w.address == address)
    }

    /// Removes every request with `served == true` from both queues,
    /// returning their `(thread_id, slot, completion, op)` for ROB
    /// write-back. Per §4.6, served is only ever set by the issuer on
    /// COL_READ/COL_WRITE. `op` lets the caller write the completion back
    /// for reads only: a write's ROB entry was already posted at enqueue
    /// time and is never revised once the COL_WRITE actually issues.
    pub fn drain_served(&mut self) -> Vec<(usize, usize, Ticks, Operation)> {
        let mut completed = Vec::new();
        for queue in [&mut self.reads, &mut self.writes] {
            let mut i = 0;
            while i < queue.len() {
                if queue[i].served {
                    let req = queue.remove(i).expect("index in bounds");
                    let completion = req.completion.expect("served implies completion was set");
                    completed.push((req.thread_id, req.slot, completion, req.op));
                } else {
                    i += 1;
                }
            }
        }
        completed
    }

    /// Write-queue length, for drain-hysteresis and capacity checks.
    #[must_use]
    pub fn write_len(&self) -> usize {
        self.writes.len()
    }

    /// Read-queue length.
    #[must_use]
    pub fn read_len(&self) -> usize {
        self.reads.len()
    }

    /// Queue of the given operation kind, for scheduler policies that treat
    /// reads and writes uniformly.
    #[must_use]
    pub fn queue(&self, op: Operation) -> &VecDeque<Request> {
        match op {
            Operation::Read => &self.reads,
            Operation::Write => &self.writes,
        }
    }

    #[must_use]
    pub fn queue_mut(&mut self, op: Operation) -> &mut VecDeque<Request> {
        match op {
            Operation::Read => &mut self.reads,
            Operation::Write => &mut self.writes,
        }
    }
}

/// Resets every pending request's `next_command`/`command_issuable` to a
/// known default before `update_queue_commands` recomputes them. Exists so
/// callers can't accidentally look at stale flags from the previous tick
/// before the recompute runs.
pub fn reset_commands(queues: &mut RequestQueues) {
    for req in queues.reads.iter_mut().chain(queues.writes.iter_mut()) {
        req.next_command = NextCommand::Nop;
        req.command_issuable = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::DecodedAddress;

    fn req(addr: u64, slot: usize) -> Request {
        Request::new(
            addr,
            DecodedAddress { channel: 0, rank: 0, bank: 0, row: 0, column: 0 },
            Ticks::ZERO,
            0,
            Operation::Read,
            slot,
            Some(0),
        )
    }

    #[test]
    fn write_then_read_same_address_hits_write_queue() {
        let mut q = RequestQueues::new();
        let mut w = req(0x100, 0);
        w.op = Operation::Write;
        assert_eq!(q.enqueue_write(w, 8), WriteEnqueueOutcome::Enqueued);

        let r = req(0x100, 1);
        assert_eq!(q.enqueue_read(r), ReadEnqueueOutcome::WriteQueueHit);
        assert_eq!(q.read_len(), 0);
        assert_eq!(q.reads_merged, 1);
    }

    #[test]
    fn duplicate_write_coalesces() {
        let mut q = RequestQueues::new();
        let mut w1 = req(0x200, 0);
        w1.op = Operation::Write;
        let mut w2 = req(0x200, 1);
        w2.op = Operation::Write;

        assert_eq!(q.enqueue_write(w1, 8), WriteEnqueueOutcome::Enqueued);
        assert_eq!(q.enqueue_write(w2, 8), WriteEnqueueOutcome::Coalesced);
        assert_eq!(q.write_len(), 1);
        assert_eq!(q.writes_merged, 1);
    }

    #[test]
    fn write_queue_full_is_reported() {
        let mut q = RequestQueues::new();
        for i in 0..2 {
            let mut w = req(0x1000 + i, i as usize);
            w.op = Operation::Write;
            assert_eq!(q.enqueue_write(w, 2), WriteEnqueueOutcome::Enqueued);
        }
        let mut w = req(0x2000, 9);
        w.op = Operation::Write;
        assert_eq!(q.enqueue_write(w, 2), WriteEnqueueOutcome::QueueFull);
    }

    #[test]
    fn drain_served_removes_and_reports_completions() {
        let mut q = RequestQueues::new();
        let mut r = req(0x300, 5);
        r.thread_id = 2;
        r.served = true;
        r.completion = Some(Ticks::new(42));
        q.reads.push_back(r);
        q.reads.push_back(req(0x400, 6));

        let completed = q.drain_served();
        assert_eq!(completed, vec![(2, 5, Ticks::new(42), Operation::Read)]);
        assert_eq!(q.read_len(), 1);
    }
}
