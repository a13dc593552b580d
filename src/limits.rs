// Resource-limit lookup from the container runtime's on-disk state

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ResourceLookupError;

/// Resolves a container's configured limits by id.
pub trait LimitSource: Send + Sync {
    /// Memory limit in bytes; 0 means no limit is configured.
    fn memory_limit(&self, id: &str) -> Result<u64, ResourceLookupError>;
}

/// Reads runc's `<root>/<id>/state.json`.
pub struct RuncStateLimits {
    root: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct State {
    config: Config,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    cgroups: Option<Cgroup>,
}

/// Newer runc flattens `Resources` into the cgroup object; older releases nest it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Cgroup {
    memory: Option<i64>,
    resources: Option<Resources>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Resources {
    memory: Option<i64>,
}

impl RuncStateLimits {
    pub const STATE_FILE: &str = "state.json";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn state_path(&self, id: &str) -> Result<PathBuf, ResourceLookupError> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\', '\0']);
        if !valid {
            return Err(ResourceLookupError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(id).join(Self::STATE_FILE))
    }
}

impl LimitSource for RuncStateLimits {
    fn memory_limit(&self, id: &str) -> Result<u64, ResourceLookupError> {
        let path = self.state_path(id)?;
        let raw = std::fs::read(&path).map_err(|source| ResourceLookupError::Io {
            id: id.to_string(),
            path: path.clone(),
            source,
        })?;
        let state: State =
            serde_json::from_slice(&raw).map_err(|source| ResourceLookupError::Parse {
                id: id.to_string(),
                source,
            })?;
        let memory = state.config.cgroups.and_then(|c| {
            c.memory
                .filter(|m| *m != 0)
                .or_else(|| c.resources.and_then(|r| r.memory))
        });
        // runc uses -1 for unlimited.
        Ok(memory.filter(|m| *m > 0).map_or(0, |m| m as u64))
    }
}
