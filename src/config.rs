use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "magneto.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub display: DisplayConfig,
    pub collector: CollectorConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// "-" reads standard input; anything else is opened as a file or FIFO.
    pub path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { path: "-".into() }
    }
}

impl InputConfig {
    pub fn is_stdin(&self) -> bool {
        self.path == "-"
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub refresh_interval_ms: u64,
    /// Clear the terminal and home the cursor before each frame.
    pub clear_screen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 5000,
            clear_screen: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub host_stat_path: String,
    /// Zero the displayed metrics after this many seconds without a sample. 0 disables.
    pub stale_after_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host_stat_path: "/proc/stat".into(),
            stale_after_secs: 0,
        }
    }
}

impl CollectorConfig {
    pub fn stale_after(&self) -> Option<Duration> {
        (self.stale_after_secs > 0).then(|| Duration::from_secs(self.stale_after_secs))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// runc state directory (e.g. /run/runc). When unset, limits come from the events.
    pub state_root: Option<String>,
}

impl AppConfig {
    /// Load from `CONFIG_FILE`, else `magneto.toml` if present, else defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = match std::env::var("CONFIG_FILE") {
            Ok(p) => p,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => DEFAULT_CONFIG_FILE.into(),
            Err(_) => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
        };
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.display.refresh_interval_ms)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.input.path.is_empty(), "input.path must be non-empty");
        anyhow::ensure!(
            self.display.refresh_interval_ms > 0,
            "display.refresh_interval_ms must be > 0, got {}",
            self.display.refresh_interval_ms
        );
        anyhow::ensure!(
            !self.collector.host_stat_path.is_empty(),
            "collector.host_stat_path must be non-empty"
        );
        if let Some(root) = &self.limits.state_root {
            anyhow::ensure!(
                !root.is_empty(),
                "limits.state_root must be non-empty when set"
            );
        }
        Ok(())
    }
}
