// Domain models: runc wire events and the metrics derived from them

mod event;
mod metrics;

pub use event::{
    Blkio, BlkioEntry, BlkioOp, Cpu, CpuUsage, Event, EventKind, Memory, MemoryEntry,
    NetworkInterface, Pids, RawSample, Stats,
};
pub use metrics::{DerivedMetrics, PreviousCounters};
