//! Validated policy structures

use crate::schema::{RawConfig, RawDaemonConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Default house count from the original deployment.
pub const DEFAULT_TOTAL_HOUSES: usize = 12;
/// 35 minutes.
pub const DEFAULT_INITIAL_DURATION_SECONDS: i64 = 35 * 60;
pub const DEFAULT_PREVIEW_ALERT_SECONDS: i64 = 10;
pub const DEFAULT_OVERTIME_ALERT_OFFSETS: [i64; 2] = [5, 10];

/// Validated policy ready for use by the engine
#[derive(Debug, Clone)]
pub struct TimerPolicy {
    pub total_houses: usize,
    pub initial_duration_seconds: i64,
    pub preview_alert_seconds: i64,
    /// Ascending seconds-into-overtime offsets.
    pub overtime_alert_offsets: Vec<i64>,
    /// None means overtime is open-ended.
    pub negative_ceiling_seconds: Option<i64>,
    /// One label per house.
    pub labels: Vec<String>,
    pub daemon: DaemonConfig,
}

impl TimerPolicy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let total_houses = raw.timers.total_houses.unwrap_or(DEFAULT_TOTAL_HOUSES);
        let labels = build_labels(raw.timers.labels, total_houses);

        Self {
            total_houses,
            initial_duration_seconds: raw
                .timers
                .initial_duration_seconds
                .unwrap_or(DEFAULT_INITIAL_DURATION_SECONDS),
            preview_alert_seconds: raw
                .timers
                .preview_alert_seconds
                .unwrap_or(DEFAULT_PREVIEW_ALERT_SECONDS),
            overtime_alert_offsets: raw
                .timers
                .overtime_alert_offsets
                .unwrap_or_else(|| DEFAULT_OVERTIME_ALERT_OFFSETS.to_vec()),
            negative_ceiling_seconds: raw.timers.negative_ceiling_seconds,
            labels,
            daemon: DaemonConfig::from_raw(raw.daemon),
        }
    }

    pub fn house_label(&self, index: usize) -> &str {
        self.labels
            .get(index)
            .map(String::as_str)
            .unwrap_or("House")
    }
}

impl Default for TimerPolicy {
    fn default() -> Self {
        Self::from_raw(RawConfig {
            config_version: crate::CURRENT_CONFIG_VERSION,
            timers: Default::default(),
            daemon: Default::default(),
        })
    }
}

fn build_labels(raw: Option<Vec<String>>, total: usize) -> Vec<String> {
    let mut labels = raw.unwrap_or_default();
    labels.truncate(total);
    for i in labels.len()..total {
        labels.push(format!("House {}", i));
    }
    labels
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            data_dir: raw
                .data_dir
                .unwrap_or_else(|| PathBuf::from("/var/lib/wardend")),
            tick_interval: Duration::from_millis(raw.tick_interval_ms.unwrap_or(1000)),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_raw(RawDaemonConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_original_deployment() {
        let policy = TimerPolicy::default();
        assert_eq!(policy.total_houses, 12);
        assert_eq!(policy.initial_duration_seconds, 2100);
        assert_eq!(policy.preview_alert_seconds, 10);
        assert_eq!(policy.overtime_alert_offsets, vec![5, 10]);
        assert!(policy.negative_ceiling_seconds.is_none());
        assert_eq!(policy.labels.len(), 12);
    }

    #[test]
    fn missing_labels_are_generated() {
        let policy = TimerPolicy::default();
        assert_eq!(policy.house_label(0), "House 0");
        assert_eq!(policy.house_label(11), "House 11");
    }

    #[test]
    fn extra_labels_are_truncated() {
        let labels = build_labels(
            Some(vec!["a".into(), "b".into(), "c".into()]),
            2,
        );
        assert_eq!(labels, vec!["a".to_string(), "b".to_string()]);
    }
}
