//! One parsed trace line.

/// The memory operation half of a trace record, if the line names one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOp {
    Read { address: u64, pc: u64 },
    Write { address: u64 },
}

/// One parsed trace line: a run of non-memory ops to retire first, then an
/// optional memory op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub nonmemops: u64,
    pub op: Option<MemOp>,
}
