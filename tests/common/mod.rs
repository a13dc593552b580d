// Shared test helpers

use magneto::error::HostStatsError;
use magneto::host_cpu::{HostCpuSource, HostCpuTime};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Host CPU source that replays scripted totals; `None` fails the read.
pub struct ScriptedHost {
    readings: Mutex<VecDeque<Option<u64>>>,
}

impl ScriptedHost {
    pub fn new(readings: impl IntoIterator<Item = Option<u64>>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
        }
    }
}

impl HostCpuSource for ScriptedHost {
    fn sample(&self) -> Result<HostCpuTime, HostStatsError> {
        match self.readings.lock().unwrap().pop_front() {
            Some(Some(total_nanos)) => Ok(HostCpuTime {
                total_nanos,
                online_cpus: 2,
            }),
            _ => Err(HostStatsError::MissingCpuLine),
        }
    }
}

/// One runc stats event line.
pub fn stats_line(id: &str, cpu_total: u64, percpu: usize, pids: u64) -> String {
    serde_json::json!({
        "type": "stats",
        "id": id,
        "data": {
            "cpu": {"usage": {"total": cpu_total, "percpu": vec![0u64; percpu]}},
            "memory": {"cache": 100, "usage": {"usage": 300, "limit": 1000}},
            "pids": {"current": pids},
            "blkio": {"ioServiceBytesRecursive": [
                {"major": 8, "minor": 0, "op": "Read", "value": 100},
                {"major": 8, "minor": 0, "op": "Write", "value": 50},
                {"major": 8, "minor": 16, "op": "Read", "value": 25},
                {"major": 8, "minor": 0, "op": "Total", "value": 999}
            ]},
            "network_interfaces": [
                {"name": "eth0", "rx_bytes": 10, "tx_bytes": 20},
                {"name": "eth1", "rx_bytes": 1, "tx_bytes": 2}
            ]
        }
    })
    .to_string()
}
