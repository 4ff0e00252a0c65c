//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Timer parameters
    #[serde(default)]
    pub timers: RawTimers,

    /// Daemon-level settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,
}

/// Timer parameters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTimers {
    /// Number of independent house timers (default: 12)
    pub total_houses: Option<usize>,

    /// Countdown length in seconds (default: 2100, i.e. 35 minutes)
    pub initial_duration_seconds: Option<i64>,

    /// Seconds before zero at which the preview alert fires (default: 10)
    pub preview_alert_seconds: Option<i64>,

    /// Seconds into overtime at which the overtime alerts fire,
    /// ascending (default: [5, 10])
    pub overtime_alert_offsets: Option<Vec<i64>>,

    /// Optional auto-stop ceiling: seconds of overtime after which a
    /// house is stopped. Absent means overtime runs indefinitely.
    pub negative_ceiling_seconds: Option<i64>,

    /// Optional display labels, padded/truncated to the house count
    pub labels: Option<Vec<String>>,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Nominal evaluation cadence in milliseconds (default: 1000)
    pub tick_interval_ms: Option<u64>,
}
