// Host CPU time from the kernel's per-CPU accounting file (/proc/stat)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::HostStatsError;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// user, nice, system, idle, iowait, irq, softirq.
const ACCOUNTED_FIELDS: usize = 7;

/// Fallback when the platform cannot report USER_HZ.
const DEFAULT_CLOCK_TICKS: u64 = 100;

/// Cumulative host CPU time at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCpuTime {
    pub total_nanos: u64,
    /// Number of `cpuN` lines seen.
    pub online_cpus: u32,
}

/// A source of cumulative host CPU time.
pub trait HostCpuSource {
    fn sample(&self) -> Result<HostCpuTime, HostStatsError>;
}

/// Reads `/proc/stat` (or a stand-in path) on every call.
pub struct ProcStatSampler {
    path: PathBuf,
    clock_ticks: u64,
}

impl ProcStatSampler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock_ticks(path, clock_ticks_per_second())
    }

    pub fn with_clock_ticks(path: impl Into<PathBuf>, clock_ticks: u64) -> Self {
        Self {
            path: path.into(),
            clock_ticks: clock_ticks.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostCpuSource for ProcStatSampler {
    fn sample(&self) -> Result<HostCpuTime, HostStatsError> {
        let file = File::open(&self.path).map_err(|source| HostStatsError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_proc_stat(BufReader::new(file), self.clock_ticks).map_err(|e| match e {
            HostStatsError::Io { source, .. } => HostStatsError::Io {
                path: self.path.clone(),
                source,
            },
            other => other,
        })
    }
}

/// Sum the first seven fields of the aggregate `cpu` line and convert ticks to ns.
pub fn parse_proc_stat(
    reader: impl BufRead,
    clock_ticks: u64,
) -> Result<HostCpuTime, HostStatsError> {
    let mut total_ticks: Option<u128> = None;
    let mut online_cpus = 0u32;

    for line in reader.lines() {
        let line = line.map_err(|source| HostStatsError::Io {
            path: PathBuf::new(),
            source,
        })?;
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        if label == "cpu" {
            total_ticks = Some(sum_cpu_fields(fields)?);
        } else if label
            .strip_prefix("cpu")
            .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        {
            online_cpus += 1;
        }
    }

    let total_ticks = total_ticks.ok_or(HostStatsError::MissingCpuLine)?;
    let nanos = total_ticks * NANOS_PER_SECOND / u128::from(clock_ticks.max(1));
    Ok(HostCpuTime {
        total_nanos: u64::try_from(nanos).unwrap_or(u64::MAX),
        online_cpus,
    })
}

fn sum_cpu_fields<'a>(fields: impl Iterator<Item = &'a str>) -> Result<u128, HostStatsError> {
    let fields: Vec<&str> = fields.collect();
    if fields.len() < ACCOUNTED_FIELDS {
        return Err(HostStatsError::TooFewFields {
            found: fields.len(),
            expected: ACCOUNTED_FIELDS,
        });
    }
    fields[..ACCOUNTED_FIELDS].iter().try_fold(0u128, |acc, v| {
        v.parse::<u64>()
            .map(|ticks| acc + u128::from(ticks))
            .map_err(|source| HostStatsError::InvalidField {
                value: (*v).to_string(),
                source,
            })
    })
}

/// USER_HZ as reported by `sysconf(_SC_CLK_TCK)`.
pub fn clock_ticks_per_second() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no side effects and is thread-safe for this query.
        let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if hz > 0 {
            return hz as u64;
        }
    }
    DEFAULT_CLOCK_TICKS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PROC_STAT: &str = "\
cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0
cpu1 1393280 32966 572056 13343292 6130 0 17875 0 23933 0
intr 1462898
ctxt 1990473
btime 1062191376
processes 2915
procs_running 1
procs_blocked 0
";

    #[test]
    fn sums_first_seven_fields() {
        let out = parse_proc_stat(Cursor::new(PROC_STAT), 100).unwrap();
        let ticks: u64 = 10132153 + 290696 + 3084719 + 46828483 + 16683 + 0 + 25195;
        assert_eq!(out.total_nanos, ticks * 10_000_000);
        assert_eq!(out.online_cpus, 2);
    }

    #[test]
    fn scales_by_clock_ticks() {
        let out = parse_proc_stat(Cursor::new("cpu 1 1 1 1 1 1 1 0 0 0\n"), 1000).unwrap();
        assert_eq!(out.total_nanos, 7 * 1_000_000);
    }

    #[test]
    fn large_counters_do_not_overflow() {
        let big = 5_000_000_000u64;
        let line = format!("cpu {big} {big} {big} {big} {big} {big} {big}\n");
        let out = parse_proc_stat(Cursor::new(line), 100).unwrap();
        assert_eq!(out.total_nanos, 7 * big * 10_000_000);
    }

    #[test]
    fn short_cpu_line_is_rejected() {
        let err = parse_proc_stat(Cursor::new("cpu 1 2 3\n"), 100).unwrap_err();
        assert!(matches!(
            err,
            HostStatsError::TooFewFields {
                found: 3,
                expected: 7
            }
        ));
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = parse_proc_stat(Cursor::new("cpu 1 2 3 x 5 6 7\n"), 100).unwrap_err();
        assert!(matches!(err, HostStatsError::InvalidField { ref value, .. } if value == "x"));
    }

    #[test]
    fn missing_aggregate_line_is_rejected() {
        let err = parse_proc_stat(Cursor::new("cpu0 1 2 3 4 5 6 7\nintr 1\n"), 100).unwrap_err();
        assert!(matches!(err, HostStatsError::MissingCpuLine));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let sampler = ProcStatSampler::with_clock_ticks(dir.path().join("stat"), 100);
        let err = sampler.sample().unwrap_err();
        assert!(matches!(err, HostStatsError::Io { .. }));
    }

    #[test]
    fn sampler_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stat");
        std::fs::write(&path, PROC_STAT).unwrap();
        let sampler = ProcStatSampler::with_clock_ticks(&path, 100);
        assert_eq!(sampler.path(), path.as_path());
        assert_eq!(sampler.sample().unwrap().online_cpus, 2);
    }

    #[test]
    fn clock_ticks_is_positive() {
        assert!(clock_ticks_per_second() > 0);
    }
}
