//! shardline.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardlineConfig {
    pub timing: TimingConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// EMA smoothing factor applied to new measurements.
    pub alpha: f64,
    /// Records unseen for this many days are pruned.
    pub max_age_days: u32,
    /// Where the timing document is persisted between runs.
    pub store_path: Option<PathBuf>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            max_age_days: 30,
            store_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wall-clock budget for the optimal search, in milliseconds.
    pub timeout_ms: u64,
    /// Duration assumed for units with no history at all.
    pub default_duration_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            default_duration_ms: 30_000,
        }
    }
}

impl ShardlineConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ShardlineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
