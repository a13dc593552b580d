// Per-sample error taxonomy surfaced through the snapshot's error slot

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Failure decoding the event stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream itself is broken (bad syntax, I/O failure, truncated record).
    /// No further records can be framed after this.
    #[error("event stream broken: {0}")]
    Stream(#[source] serde_json::Error),

    /// A well-framed record did not have the expected event or stats shape.
    #[error("malformed event: {0}")]
    Shape(#[source] serde_json::Error),
}

impl DecodeError {
    /// Whether the decoder can produce further records after this error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecodeError::Stream(_))
    }
}

/// Host CPU accounting could not be read.
#[derive(Debug, Error)]
pub enum HostStatsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no aggregate cpu line in accounting source")]
    MissingCpuLine,

    #[error("cpu line has {found} fields, expected at least {expected}")]
    TooFewFields { found: usize, expected: usize },

    #[error("invalid cpu field '{value}': {source}")]
    InvalidField {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// The resource-limit collaborator could not resolve a container's limits.
#[derive(Debug, Error)]
pub enum ResourceLookupError {
    #[error("reading state for '{id}' at {path}: {source}")]
    Io {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing state for '{id}': {source}")]
    Parse {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid container id '{0}'")]
    InvalidId(String),
}

/// Any failure local to one sample.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("collecting system cpu usage failed: {0}")]
    HostStatsUnavailable(#[from] HostStatsError),

    #[error("resource limit lookup failed: {0}")]
    ResourceLookup(#[from] ResourceLookupError),
}
