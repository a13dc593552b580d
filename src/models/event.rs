// runc `events --stats` wire models

use serde::Deserialize;

/// Kind of a runc event; only `stats` events carry usage data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EventKind {
    Stats,
    Other,
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        if s == "stats" {
            EventKind::Stats
        } else {
            EventKind::Other
        }
    }
}

/// One decoded record: `{"type": ..., "id": ..., "data": ...}`.
///
/// `data` is kept as raw JSON until the event is known to be a stats event,
/// since other event kinds (e.g. `oom`) carry differently shaped payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    /// Extract the stats payload. Returns `Ok(None)` for non-stats events.
    pub fn into_sample(self) -> Result<Option<RawSample>, serde_json::Error> {
        if self.kind != EventKind::Stats {
            return Ok(None);
        }
        let stats = if self.data.is_null() {
            Stats::default()
        } else {
            serde_json::from_value(self.data)?
        };
        Ok(Some(RawSample { id: self.id, stats }))
    }
}

/// A stats event payload tagged with the container it belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSample {
    pub id: String,
    pub stats: Stats,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub cpu: Cpu,
    pub memory: Memory,
    pub pids: Pids,
    pub blkio: Blkio,
    #[serde(deserialize_with = "null_as_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Cpu {
    pub usage: CpuUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CpuUsage {
    /// Cumulative CPU time in nanoseconds.
    pub total: u64,
    #[serde(deserialize_with = "null_as_empty")]
    pub percpu: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Memory {
    /// Page cache bytes; included in `usage.usage`.
    pub cache: u64,
    pub usage: MemoryEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemoryEntry {
    pub limit: u64,
    pub usage: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Pids {
    pub current: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Blkio {
    #[serde(rename = "ioServiceBytesRecursive", deserialize_with = "null_as_empty")]
    pub io_service_bytes_recursive: Vec<BlkioEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlkioEntry {
    #[serde(default = "BlkioOp::other")]
    pub op: BlkioOp,
    #[serde(default)]
    pub value: u64,
}

/// Block I/O operation; runc reports cgroup v1 style names ("Read", "Write", "Sync", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum BlkioOp {
    Read,
    Write,
    Other,
}

impl BlkioOp {
    fn other() -> Self {
        BlkioOp::Other
    }
}

impl From<String> for BlkioOp {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("read") {
            BlkioOp::Read
        } else if s.eq_ignore_ascii_case("write") {
            BlkioOp::Write
        } else {
            BlkioOp::Other
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// runc emits `null` for empty slices; treat it the same as a missing field.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_event_decodes_runc_shape() {
        let json = r#"{
            "type": "stats",
            "id": "web",
            "data": {
                "cpu": {"usage": {"total": 1500, "percpu": [1000, 500], "kernel": 10, "user": 20}},
                "memory": {"cache": 100, "usage": {"limit": 1000, "usage": 300, "failcnt": 0}},
                "pids": {"current": 7},
                "blkio": {"ioServiceBytesRecursive": [
                    {"major": 8, "minor": 0, "op": "Read", "value": 100},
                    {"major": 8, "minor": 0, "op": "Sync", "value": 5}
                ]},
                "network_interfaces": [{"name": "eth0", "rx_bytes": 10, "tx_bytes": 20}]
            }
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::Stats);
        let sample = event.into_sample().unwrap().unwrap();
        assert_eq!(sample.id, "web");
        assert_eq!(sample.stats.cpu.usage.total, 1500);
        assert_eq!(sample.stats.cpu.usage.percpu.len(), 2);
        assert_eq!(sample.stats.memory.usage.limit, 1000);
        assert_eq!(sample.stats.pids.current, 7);
        assert_eq!(sample.stats.blkio.io_service_bytes_recursive[0].op, BlkioOp::Read);
        assert_eq!(sample.stats.blkio.io_service_bytes_recursive[1].op, BlkioOp::Other);
        assert_eq!(sample.stats.network_interfaces[0].tx_bytes, 20);
    }

    #[test]
    fn null_slices_and_missing_sections_default() {
        let json = r#"{"type":"stats","id":"x","data":{"cpu":{"usage":{"total":1,"percpu":null}},"network_interfaces":null}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        let sample = event.into_sample().unwrap().unwrap();
        assert!(sample.stats.cpu.usage.percpu.is_empty());
        assert!(sample.stats.network_interfaces.is_empty());
        assert_eq!(sample.stats.memory, Memory::default());
    }

    #[test]
    fn non_stats_event_yields_no_sample() {
        let json = r#"{"type":"oom","id":"x","data":{"whatever":true}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::Other);
        assert!(event.into_sample().unwrap().is_none());
    }

    #[test]
    fn mistyped_stats_payload_is_an_error() {
        let json = r#"{"type":"stats","id":"x","data":{"pids":{"current":"many"}}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(event.into_sample().is_err());
    }

    #[test]
    fn blkio_op_is_case_insensitive() {
        assert_eq!(BlkioOp::from("read".to_string()), BlkioOp::Read);
        assert_eq!(BlkioOp::from("WRITE".to_string()), BlkioOp::Write);
        assert_eq!(BlkioOp::from("Total".to_string()), BlkioOp::Other);
    }
}
