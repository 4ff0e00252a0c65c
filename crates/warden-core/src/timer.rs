//! Per-house timer state

use warden_api::{Phase, TimerRecord};
use warden_util::{elapsed_secs, EpochMillis, SegmentId};

/// State of one house timer.
///
/// `displayed_remaining` is derived, never authoritative: every
/// evaluation recomputes it from `started_at` and the wall clock, so a
/// skipped evaluation can never make the display drift.
#[derive(Debug, Clone)]
pub struct HouseTimer {
    pub phase: Phase,

    /// Epoch-millisecond anchor of the current phase segment.
    /// `Some` iff `phase != Idle`.
    pub started_at: Option<EpochMillis>,

    /// Anchor duration in seconds: the countdown length while Running,
    /// re-anchored to 0 on entering Overtime.
    pub total_duration: i64,

    /// Last computed signed remaining seconds.
    pub displayed_remaining: i64,

    /// One-shot: the pre-zero alert already fired this segment.
    pub preview_fired: bool,

    /// One-shot per configured overtime offset, in offset order.
    pub overtime_fired: Vec<bool>,

    /// Identity of the current Running/Overtime segment. Regenerated on
    /// every fresh start so stale ticks can be recognized.
    pub segment: SegmentId,
}

impl HouseTimer {
    /// A fresh idle timer showing the configured duration.
    pub fn idle(initial_duration: i64, offset_count: usize) -> Self {
        Self {
            phase: Phase::Idle,
            started_at: None,
            total_duration: initial_duration,
            displayed_remaining: initial_duration,
            preview_fired: false,
            overtime_fired: vec![false; offset_count],
            segment: SegmentId::new(),
        }
    }

    /// Begin a fresh Running segment anchored at `now`. Clears all
    /// alert history and mints a new segment identity.
    pub fn begin_segment(&mut self, now: EpochMillis, duration: i64) {
        self.phase = Phase::Running;
        self.started_at = Some(now);
        self.total_duration = duration;
        self.displayed_remaining = duration;
        self.clear_alert_flags();
        self.segment = SegmentId::new();
    }

    /// Return to Idle. Clears the anchor, alert history, and display.
    pub fn reset_to_idle(&mut self, initial_duration: i64) {
        self.phase = Phase::Idle;
        self.started_at = None;
        self.total_duration = initial_duration;
        self.displayed_remaining = initial_duration;
        self.clear_alert_flags();
        self.segment = SegmentId::new();
    }

    /// Running -> Overtime re-anchor: subsequent overtime elapsed is
    /// measured from the observed zero crossing, not the original
    /// start. Called exactly once per Running segment.
    pub fn enter_overtime(&mut self, now: EpochMillis) {
        self.phase = Phase::Overtime;
        self.started_at = Some(now);
        self.total_duration = 0;
        self.displayed_remaining = 0;
    }

    pub fn clear_alert_flags(&mut self) {
        self.preview_fired = false;
        for fired in &mut self.overtime_fired {
            *fired = false;
        }
    }

    /// Whole seconds since the current anchor.
    pub fn elapsed_at(&self, now: EpochMillis) -> Option<i64> {
        self.started_at.map(|started| elapsed_secs(started, now))
    }

    /// Signed remaining seconds as a pure function of
    /// `(phase, started_at, total_duration, now)`.
    pub fn remaining_at(&self, now: EpochMillis) -> Option<i64> {
        let elapsed = self.elapsed_at(now)?;
        match self.phase {
            Phase::Idle => None,
            Phase::Running => Some(self.total_duration - elapsed),
            Phase::Overtime => Some(-(elapsed - self.total_duration)),
        }
    }

    /// Seconds spent in overtime so far.
    pub fn overtime_elapsed_at(&self, now: EpochMillis) -> Option<i64> {
        if self.phase != Phase::Overtime {
            return None;
        }
        Some(self.elapsed_at(now)? - self.total_duration)
    }

    /// Persisted record for this state.
    pub fn to_record(&self) -> TimerRecord {
        TimerRecord {
            duration: self.displayed_remaining,
            extended: self.phase == Phase::Overtime,
            negative: self.phase == Phase::Overtime,
            running: self.phase.is_active(),
            start_time: self.started_at,
            total_duration: self.total_duration,
        }
    }
}
