// Convert cumulative runc counters into point-in-time metrics

use crate::host_cpu::HostCpuTime;
use crate::models::{
    Blkio, BlkioOp, DerivedMetrics, Memory, NetworkInterface, PreviousCounters, RawSample,
};

/// Derive metrics for one stats sample and return the counters to keep for the next one.
///
/// Pure: the same inputs always give the same outputs. Callers only pass stats samples.
pub fn compute(
    prev: PreviousCounters,
    host: HostCpuTime,
    sample: &RawSample,
) -> (DerivedMetrics, PreviousCounters) {
    let stats = &sample.stats;
    let total_cpu_nanos = stats.cpu.usage.total;

    // cgroup v2 runc reports no per-cpu breakdown; fall back to the host's count.
    let cpus = match stats.cpu.usage.percpu.len() {
        0 => host.online_cpus as usize,
        n => n,
    };
    let cpu_percent = cpu_percent(prev, total_cpu_nanos, host.total_nanos, cpus);

    let memory_bytes = working_set(&stats.memory);
    let memory_limit_bytes = stats.memory.usage.limit;
    let (net_rx_bytes, net_tx_bytes) = network_io(&stats.network_interfaces);
    let (block_read_bytes, block_write_bytes) = block_io(&stats.blkio);

    let metrics = DerivedMetrics {
        cpu_percent,
        memory_bytes,
        memory_limit_bytes,
        memory_percent: memory_percent(memory_bytes, memory_limit_bytes),
        net_rx_bytes,
        net_tx_bytes,
        block_read_bytes,
        block_write_bytes,
        pids_current: stats.pids.current,
    };
    let next = PreviousCounters {
        total_cpu_nanos,
        host_cpu_nanos: host.total_nanos,
    };
    (metrics, next)
}

/// Container share of host CPU time since the previous sample, scaled by CPU count.
/// Deltas that would be negative (counter reset) clamp to zero.
pub fn cpu_percent(
    prev: PreviousCounters,
    total_cpu_nanos: u64,
    host_nanos: u64,
    cpus: usize,
) -> f64 {
    // No baseline before the first sample.
    if prev.host_cpu_nanos == 0 {
        return 0.0;
    }
    let cpu_delta = total_cpu_nanos.saturating_sub(prev.total_cpu_nanos);
    let system_delta = host_nanos.saturating_sub(prev.host_cpu_nanos);
    if system_delta > 0 && cpu_delta > 0 {
        (cpu_delta as f64 / system_delta as f64) * cpus as f64 * 100.0
    } else {
        0.0
    }
}

/// Memory usage with page cache excluded.
pub fn working_set(memory: &Memory) -> u64 {
    memory.usage.usage.saturating_sub(memory.cache)
}

/// A zero limit means no limit data, reported as 0%.
pub fn memory_percent(used: u64, limit: u64) -> f64 {
    if limit != 0 {
        used as f64 / limit as f64 * 100.0
    } else {
        0.0
    }
}

/// Total bytes read and written across all devices and hierarchy levels.
pub fn block_io(blkio: &Blkio) -> (u64, u64) {
    blkio
        .io_service_bytes_recursive
        .iter()
        .fold((0u64, 0u64), |(read, write), e| match e.op {
            BlkioOp::Read => (read.saturating_add(e.value), write),
            BlkioOp::Write => (read, write.saturating_add(e.value)),
            BlkioOp::Other => (read, write),
        })
}

pub fn network_io(interfaces: &[NetworkInterface]) -> (u64, u64) {
    interfaces.iter().fold((0u64, 0u64), |(rx, tx), i| {
        (rx.saturating_add(i.rx_bytes), tx.saturating_add(i.tx_bytes))
    })
}
