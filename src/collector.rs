// Collector: decode events, derive metrics, publish them to the shared snapshot.
// Owns the previous-sample counters; the only writer of the snapshot.

use std::io::Read;
use std::sync::Arc;

use crate::decoder::EventDecoder;
use crate::error::{DecodeError, ResourceLookupError, SampleError};
use crate::host_cpu::HostCpuSource;
use crate::limits::LimitSource;
use crate::metrics;
use crate::models::{DerivedMetrics, Event, PreviousCounters};
use crate::snapshot::SharedSnapshot;

/// Result of processing one decoded event.
#[derive(Debug)]
pub enum Outcome {
    /// Not a stats event; nothing changed.
    Skipped,
    /// A stats sample was processed. A failed limit lookup still yields metrics,
    /// with the memory limit treated as unknown.
    Sample {
        metrics: DerivedMetrics,
        lookup_error: Option<ResourceLookupError>,
    },
}

/// Why the collector stopped. Either way no further samples can arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Input ended cleanly between records.
    EndOfInput,
    /// The stream broke mid-record or stopped being valid JSON.
    StreamBroken,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub events: u64,
    pub samples: u64,
    pub skipped: u64,
    pub errors: u64,
    /// Input bytes consumed by the decoder.
    pub bytes: u64,
}

pub struct Collector<H> {
    host: H,
    limits: Option<Arc<dyn LimitSource>>,
    snapshot: Arc<SharedSnapshot>,
    prev: PreviousCounters,
    stats: CollectorStats,
}

impl<H: HostCpuSource> Collector<H> {
    pub fn new(host: H, snapshot: Arc<SharedSnapshot>) -> Self {
        Self {
            host,
            limits: None,
            snapshot,
            prev: PreviousCounters::default(),
            stats: CollectorStats::default(),
        }
    }

    /// Take memory limits from `limits` instead of the samples themselves.
    pub fn with_limits(mut self, limits: Arc<dyn LimitSource>) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn previous(&self) -> PreviousCounters {
        self.prev
    }

    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    /// Process one event without touching the snapshot.
    ///
    /// On error the previous counters are left unchanged, so the next sample's
    /// deltas are still taken against the last good one.
    pub fn process(&mut self, event: Event) -> Result<Outcome, SampleError> {
        let Some(mut sample) = event.into_sample().map_err(DecodeError::Shape)? else {
            return Ok(Outcome::Skipped);
        };

        let host = self.host.sample()?;

        let mut lookup_error = None;
        if let Some(limits) = &self.limits {
            sample.stats.memory.usage.limit = match limits.memory_limit(&sample.id) {
                Ok(limit) => limit,
                Err(e) => {
                    lookup_error = Some(e);
                    0
                }
            };
        }

        let (metrics, next) = metrics::compute(self.prev, host, &sample);
        self.prev = next;
        Ok(Outcome::Sample {
            metrics,
            lookup_error,
        })
    }

    /// Drive the decoder until the input ends. Per-sample failures are recorded
    /// in the snapshot and never stop the loop.
    pub fn run<R: Read>(&mut self, mut decoder: EventDecoder<R>) -> Termination {
        tracing::info!("Collector started");
        while let Some(item) = decoder.next() {
            self.stats.events += 1;
            self.stats.bytes = decoder.byte_offset() as u64;
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    let terminal = e.is_terminal();
                    tracing::warn!(
                        error = %e,
                        terminal,
                        offset = self.stats.bytes,
                        operation = "decode",
                        "decode failed"
                    );
                    self.stats.errors += 1;
                    self.snapshot.write_error(e.into());
                    if terminal {
                        self.log_exit(Termination::StreamBroken);
                        return Termination::StreamBroken;
                    }
                    continue;
                }
            };

            match self.process(event) {
                Ok(Outcome::Skipped) => {
                    self.stats.skipped += 1;
                    tracing::trace!("skipped non-stats event");
                }
                Ok(Outcome::Sample {
                    metrics,
                    lookup_error,
                }) => {
                    self.stats.samples += 1;
                    if let Some(e) = &lookup_error {
                        self.stats.errors += 1;
                        tracing::warn!(error = %e, operation = "memory_limit", "limit lookup failed");
                    }
                    tracing::debug!(
                        cpu_percent = metrics.cpu_percent,
                        memory_bytes = metrics.memory_bytes,
                        pids = metrics.pids_current,
                        "sample processed"
                    );
                    self.snapshot
                        .publish(metrics, lookup_error.map(SampleError::from));
                }
                Err(e) => {
                    self.stats.errors += 1;
                    tracing::warn!(error = %e, operation = "process_sample", "sample dropped");
                    self.snapshot.write_error(e);
                }
            }
        }
        self.stats.bytes = decoder.byte_offset() as u64;
        self.log_exit(Termination::EndOfInput);
        Termination::EndOfInput
    }

    fn log_exit(&self, reason: Termination) {
        let CollectorStats {
            events,
            samples,
            skipped,
            errors,
            bytes,
        } = self.stats;
        tracing::info!(
            ?reason,
            events,
            samples,
            skipped,
            errors,
            bytes,
            "Collector terminated; no further samples"
        );
    }
}
