//! Phase, alert, and persisted record types

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_util::EpochMillis;

/// Discrete state of one house timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not counting; display shows the configured duration.
    Idle,
    /// Counting down from the configured duration.
    Running,
    /// Past zero; remaining is negative and grows in magnitude until an
    /// explicit stop or restart.
    Overtime,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        !matches!(self, Phase::Idle)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Overtime => "overtime",
        };
        f.write_str(s)
    }
}

/// Kinds of one-shot alerts a house can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Countdown entered the final stretch (default: 10 s before zero).
    Preview,
    /// Countdown crossed zero into overtime.
    ZeroCrossing,
    /// Overtime reached one of the configured offsets (default: 5 s
    /// and 10 s past zero).
    Overtime { offset_seconds: i64 },
    /// Overtime reached the configured negative ceiling (optional,
    /// off by default) and the house was stopped.
    CeilingReached,
}

/// Persisted snapshot of one house, one record per `timer-<i>` key.
///
/// The field names and shapes are load-bearing: exported JSON must stay
/// interchangeable with the original browser snapshots, so this struct
/// is the only place the wire spelling appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    /// Last displayed signed remaining seconds.
    pub duration: i64,

    /// True once the countdown has crossed zero.
    pub extended: bool,

    /// True while the displayed value is negative (set together with
    /// `extended` at the zero crossing).
    pub negative: bool,

    /// True while the house is Running or in Overtime.
    pub running: bool,

    /// Epoch-millisecond anchor of the current phase segment; null when
    /// the house is idle.
    #[serde(rename = "startTime")]
    pub start_time: Option<EpochMillis>,

    /// Anchor duration in seconds: the configured countdown length
    /// while running, 0 after the overtime re-anchor.
    #[serde(rename = "totalDuration")]
    pub total_duration: i64,
}

impl TimerRecord {
    /// An idle record showing the configured duration.
    pub fn idle(initial_duration: i64) -> Self {
        Self {
            duration: initial_duration,
            extended: false,
            negative: false,
            running: false,
            start_time: None,
            total_duration: initial_duration,
        }
    }

    /// Shape checks beyond what serde enforces. Records failing this
    /// are treated as corrupt and discarded by the loader.
    pub fn is_plausible(&self) -> bool {
        if self.total_duration < 0 {
            return false;
        }
        if let Some(ts) = self.start_time {
            if ts < 0 {
                return false;
            }
        }
        // Overtime without an anchor cannot be resumed meaningfully.
        if self.running && self.negative && self.start_time.is_none() {
            return false;
        }
        true
    }

    /// Phase implied by the record's flags.
    pub fn phase(&self) -> Phase {
        if !self.running {
            Phase::Idle
        } else if self.negative || self.extended {
            Phase::Overtime
        } else {
            Phase::Running
        }
    }
}

/// Persisted key for a house, `timer-<i>`.
pub fn record_key(index: usize) -> String {
    format!("timer-{}", index)
}

/// Parse a `timer-<i>` key back to its index.
pub fn parse_record_key(key: &str) -> Option<usize> {
    key.strip_prefix("timer-")?.parse().ok()
}
