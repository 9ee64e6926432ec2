//! Per-core fetch state: the trace reader, its assigned address prefix,
//! its ROB, and the lookahead over the current trace record (§4.9).

use usimm_config::Ticks;
use usimm_rob::Rob;
use usimm_trace::{Prefix, TraceReader, TraceRecord};

/// One core's fetch-side bookkeeping: the current trace record, partially
/// consumed, as a single value rather than several parallel fields.
pub struct CoreState {
    pub reader: TraceReader,
    pub prefix: Prefix,
    pub rob: Rob,
    /// The record currently being drained, and how many of its
    /// `nonmemops` are still unconsumed. `None` once the reader is
    /// exhausted and every prior record has been fully drained.
    pub pending: Option<(TraceRecord, u64)>,
    /// Trace file returned EOF; no more records will ever arrive.
    pub trace_done: bool,
    /// Cycle at which this core's trace finished and its ROB emptied.
    pub time_done: Option<Ticks>,
}

impl CoreState {
    pub fn new(reader: TraceReader, prefix: Prefix, rob_size: usize) -> Self {
        Self { reader, prefix, rob: Rob::new(rob_size), pending: None, trace_done: false, time_done: None }
    }

    /// True once the trace is exhausted and every fetched instruction has
    /// retired: this core no longer participates in the run.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.trace_done && self.rob.is_empty()
    }
}
