// Derived metrics and the counter baseline they are computed against

/// Point-in-time view of one container, as rendered in the stats table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    pub cpu_percent: f64,
    /// Working set: usage excluding page cache.
    pub memory_bytes: u64,
    pub memory_limit_bytes: u64,
    pub memory_percent: f64,
    pub net_rx_bytes: u64,
    pub net_tx_bytes: u64,
    pub block_read_bytes: u64,
    pub block_write_bytes: u64,
    pub pids_current: u64,
}

/// Cumulative counters from the last processed stats sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviousCounters {
    /// Container CPU time in nanoseconds.
    pub total_cpu_nanos: u64,
    /// Host CPU time in nanoseconds.
    pub host_cpu_nanos: u64,
}
