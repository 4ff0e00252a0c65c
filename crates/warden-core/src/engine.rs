//! Timer engine: owns per-house state and produces events
//!
//! All public operations take the current wall-clock time as a
//! parameter instead of reading a clock, which keeps every state
//! transition deterministic and testable.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use warden_api::{AlertKind, Phase, TimerRecord};
use warden_config::TimerPolicy;
use warden_store::Store;
use warden_util::{EpochMillis, HouseId, SegmentToken, WardenError};

use crate::events::CoreEvent;
use crate::timer::HouseTimer;

/// Result of evaluating one scheduled tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// The segment was still live and has been evaluated.
    Evaluated {
        remaining_seconds: i64,
        events: Vec<CoreEvent>,
    },
    /// The token no longer names the current segment of its house.
    /// The tick must be dropped without touching any state.
    Stale,
}

/// Engine driving every house timer.
pub struct TimerEngine {
    policy: TimerPolicy,
    store: Arc<dyn Store>,
    houses: Vec<HouseTimer>,
}

impl TimerEngine {
    pub fn new(policy: TimerPolicy, store: Arc<dyn Store>) -> Self {
        let houses = (0..policy.total_houses)
            .map(|_| {
                HouseTimer::idle(
                    policy.initial_duration_seconds,
                    policy.overtime_alert_offsets.len(),
                )
            })
            .collect();

        Self {
            policy,
            store,
            houses,
        }
    }

    pub fn policy(&self) -> &TimerPolicy {
        &self.policy
    }

    pub fn house(&self, house: HouseId) -> Result<&HouseTimer, WardenError> {
        self.houses.get(house.index()).ok_or(WardenError::InvalidHouse {
            index: house.index(),
            total: self.houses.len(),
        })
    }

    fn house_mut(&mut self, house: HouseId) -> Result<&mut HouseTimer, WardenError> {
        let total = self.houses.len();
        self.houses
            .get_mut(house.index())
            .ok_or(WardenError::InvalidHouse {
                index: house.index(),
                total,
            })
    }

    /// Start a fresh countdown for a house. Starting an already active
    /// house abandons its current segment and begins a new one.
    pub fn start(
        &mut self,
        house: HouseId,
        now: EpochMillis,
    ) -> Result<(SegmentToken, Vec<CoreEvent>), WardenError> {
        let duration = self.policy.initial_duration_seconds;
        let timer = self.house_mut(house)?;

        if timer.phase.is_active() {
            debug!(house = %house, "restarting active house");
        }
        timer.begin_segment(now, duration);
        let token = SegmentToken::new(house, timer.segment);

        let events = vec![
            CoreEvent::PhaseChanged {
                house,
                phase: Phase::Running,
            },
            CoreEvent::DisplayUpdated {
                house,
                remaining_seconds: duration,
            },
        ];

        info!(
            house = %house,
            label = self.policy.house_label(house.index()),
            duration,
            "timer started"
        );
        self.persist(house);
        Ok((token, events))
    }

    /// Stop a house and return it to Idle showing the full duration.
    pub fn stop(&mut self, house: HouseId, _now: EpochMillis) -> Result<Vec<CoreEvent>, WardenError> {
        let initial = self.policy.initial_duration_seconds;
        let timer = self.house_mut(house)?;

        let was_active = timer.phase.is_active();
        timer.reset_to_idle(initial);

        let mut events = Vec::new();
        if was_active {
            events.push(CoreEvent::PhaseChanged {
                house,
                phase: Phase::Idle,
            });
        }
        events.push(CoreEvent::DisplayUpdated {
            house,
            remaining_seconds: initial,
        });

        info!(house = %house, "timer stopped");
        self.persist(house);
        Ok(events)
    }

    /// Stop then immediately start, yielding a fresh segment token.
    pub fn restart(
        &mut self,
        house: HouseId,
        now: EpochMillis,
    ) -> Result<(SegmentToken, Vec<CoreEvent>), WardenError> {
        self.start(house, now)
    }

    /// Stop every active house. Emits per-house events followed by a
    /// single summary event carrying the count of houses stopped.
    pub fn stop_all(&mut self, now: EpochMillis) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        let mut stopped = 0;

        for index in 0..self.houses.len() {
            let house = HouseId::from_index_unchecked(index);
            if self.houses[index].phase.is_active() {
                stopped += 1;
                match self.stop(house, now) {
                    Ok(mut house_events) => events.append(&mut house_events),
                    Err(err) => warn!(house = %house, %err, "stop_all skipped house"),
                }
            }
        }

        info!(stopped, "all timers stopped");
        events.push(CoreEvent::AllStopped { stopped });
        events
    }

    /// Evaluate one scheduled tick. The token must name the live
    /// segment of its house; anything else is reported as stale so the
    /// scheduler drops it instead of mutating a segment that has moved
    /// on underneath it.
    pub fn tick(&mut self, token: SegmentToken, now: EpochMillis) -> TickOutcome {
        let timer = match self.houses.get(token.house.index()) {
            Some(timer) => timer,
            None => return TickOutcome::Stale,
        };
        if !timer.phase.is_active() || timer.segment != token.segment {
            return TickOutcome::Stale;
        }

        let (remaining_seconds, events) = self.evaluate_house(token.house, now);
        self.persist(token.house);
        TickOutcome::Evaluated {
            remaining_seconds,
            events,
        }
    }

    /// Tokens for every currently active segment, in house order.
    pub fn active_tokens(&self) -> Vec<SegmentToken> {
        self.houses
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.phase.is_active())
            .map(|(index, timer)| {
                SegmentToken::new(HouseId::from_index_unchecked(index), timer.segment)
            })
            .collect()
    }

    /// Re-evaluate every active house against the current clock.
    /// Used after a detected scheduling gap: each house's remaining is
    /// recomputed from its anchor, so the display catches up in one
    /// pass no matter how long the gap was.
    pub fn resync(&mut self, now: EpochMillis) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        for index in 0..self.houses.len() {
            if !self.houses[index].phase.is_active() {
                continue;
            }
            let house = HouseId::from_index_unchecked(index);
            let (_, mut house_events) = self.evaluate_house(house, now);
            events.append(&mut house_events);
            self.persist(house);
        }
        events
    }

    /// Core per-house evaluation: recompute remaining from the anchor,
    /// fire any one-shot alerts that have been crossed, and handle the
    /// zero crossing. Callers persist afterwards.
    fn evaluate_house(&mut self, house: HouseId, now: EpochMillis) -> (i64, Vec<CoreEvent>) {
        let preview = self.policy.preview_alert_seconds;
        let offsets = self.policy.overtime_alert_offsets.clone();
        let ceiling = self.policy.negative_ceiling_seconds;
        let initial = self.policy.initial_duration_seconds;
        let label = self.policy.house_label(house.index()).to_string();

        let timer = &mut self.houses[house.index()];
        let mut events = Vec::new();

        match timer.phase {
            Phase::Idle => (timer.displayed_remaining, events),

            Phase::Running => {
                let remaining = timer
                    .remaining_at(now)
                    .unwrap_or(timer.displayed_remaining);

                if remaining <= 0 {
                    // Crossing observed: overtime is measured from this
                    // observation, not from the nominal expiry instant.
                    timer.preview_fired = true;
                    timer.enter_overtime(now);
                    events.push(CoreEvent::PhaseChanged {
                        house,
                        phase: Phase::Overtime,
                    });
                    events.push(CoreEvent::Alert {
                        house,
                        kind: AlertKind::ZeroCrossing,
                    });
                    events.push(CoreEvent::DisplayUpdated {
                        house,
                        remaining_seconds: 0,
                    });
                    info!(house = %house, label = %label, "countdown expired, entering overtime");
                    (0, events)
                } else {
                    if remaining <= preview && !timer.preview_fired {
                        timer.preview_fired = true;
                        events.push(CoreEvent::Alert {
                            house,
                            kind: AlertKind::Preview,
                        });
                        debug!(house = %house, remaining, "preview alert fired");
                    }
                    timer.displayed_remaining = remaining;
                    events.push(CoreEvent::DisplayUpdated {
                        house,
                        remaining_seconds: remaining,
                    });
                    (remaining, events)
                }
            }

            Phase::Overtime => {
                let overtime_elapsed = timer.overtime_elapsed_at(now).unwrap_or(0);
                let remaining = -overtime_elapsed;

                // Mark every offset crossed since the last evaluation
                // but voice only the most recent one, so a long gap
                // produces a single alert instead of a burst.
                let mut latest_crossed = None;
                for (i, offset) in offsets.iter().enumerate() {
                    if overtime_elapsed >= *offset && !timer.overtime_fired[i] {
                        timer.overtime_fired[i] = true;
                        latest_crossed = Some(*offset);
                    }
                }
                if let Some(offset_seconds) = latest_crossed {
                    events.push(CoreEvent::Alert {
                        house,
                        kind: AlertKind::Overtime { offset_seconds },
                    });
                    debug!(house = %house, offset_seconds, "overtime alert fired");
                }

                if let Some(limit) = ceiling {
                    if overtime_elapsed >= limit {
                        events.push(CoreEvent::Alert {
                            house,
                            kind: AlertKind::CeilingReached,
                        });
                        timer.reset_to_idle(initial);
                        events.push(CoreEvent::PhaseChanged {
                            house,
                            phase: Phase::Idle,
                        });
                        events.push(CoreEvent::DisplayUpdated {
                            house,
                            remaining_seconds: initial,
                        });
                        info!(house = %house, label = %label, limit, "overtime ceiling reached, stopping");
                        return (initial, events);
                    }
                }

                timer.displayed_remaining = remaining;
                events.push(CoreEvent::DisplayUpdated {
                    house,
                    remaining_seconds: remaining,
                });
                (remaining, events)
            }
        }
    }

    /// Current persisted-shape snapshot of one house.
    pub fn snapshot(&self, house: HouseId) -> Result<TimerRecord, WardenError> {
        Ok(self.house(house)?.to_record())
    }

    /// Rebuild one house from a persisted record. Alert history is not
    /// part of the record, so flags start cleared and the immediate
    /// evaluation re-derives whatever a long-downtime gap crossed,
    /// voicing only the latest threshold.
    pub fn restore(
        &mut self,
        house: HouseId,
        record: &TimerRecord,
        now: EpochMillis,
    ) -> Result<Vec<CoreEvent>, WardenError> {
        let initial = self.policy.initial_duration_seconds;
        let timer = self.house_mut(house)?;

        if !record.is_plausible() {
            warn!(house = %house, "implausible record, falling back to idle");
            timer.reset_to_idle(initial);
            self.persist(house);
            return Ok(vec![CoreEvent::DisplayUpdated {
                house,
                remaining_seconds: initial,
            }]);
        }

        match record.phase() {
            Phase::Idle => {
                timer.reset_to_idle(initial);
                timer.displayed_remaining = record.duration;
                timer.total_duration = record.total_duration;
                let remaining_seconds = timer.displayed_remaining;
                self.persist(house);
                Ok(vec![CoreEvent::DisplayUpdated {
                    house,
                    remaining_seconds,
                }])
            }
            Phase::Running | Phase::Overtime => {
                let anchor = match record.start_time {
                    Some(anchor) => anchor,
                    None => {
                        warn!(house = %house, "active record without anchor, falling back to idle");
                        timer.reset_to_idle(initial);
                        self.persist(house);
                        return Ok(vec![CoreEvent::DisplayUpdated {
                            house,
                            remaining_seconds: initial,
                        }]);
                    }
                };

                timer.phase = record.phase();
                timer.started_at = Some(anchor);
                timer.total_duration = record.total_duration;
                timer.displayed_remaining = record.duration;
                timer.clear_alert_flags();
                timer.segment = warden_util::SegmentId::new();

                info!(house = %house, phase = %record.phase(), "restored active timer");
                let (_, events) = self.evaluate_house(house, now);
                self.persist(house);
                Ok(events)
            }
        }
    }

    /// Load every readable record from the store and rebuild state.
    /// Houses with no record stay idle. A failing store read leaves
    /// everything idle rather than aborting startup.
    pub fn restore_all(&mut self, now: EpochMillis) -> Vec<CoreEvent> {
        let records = match self.store.load_all() {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "could not load persisted state, starting fresh");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        for (index, record) in records {
            let house = match HouseId::new(index, self.houses.len()) {
                Ok(house) => house,
                Err(_) => {
                    warn!(index, "persisted record for unknown house, skipping");
                    continue;
                }
            };
            match self.restore(house, &record, now) {
                Ok(mut house_events) => events.append(&mut house_events),
                Err(err) => warn!(house = %house, %err, "restore failed, house left idle"),
            }
        }
        events
    }

    /// Export every house as its persisted record shape. Active houses
    /// get their `duration` recomputed at `now` so the exported display
    /// value is current, not the value from the last evaluation.
    pub fn export_all(&self, now: EpochMillis) -> BTreeMap<usize, TimerRecord> {
        self.houses
            .iter()
            .enumerate()
            .map(|(index, timer)| {
                let mut record = timer.to_record();
                if let Some(remaining) = timer.remaining_at(now) {
                    // A running timer past its expiry has simply not
                    // been observed yet; export it as 0, not negative.
                    record.duration = match timer.phase {
                        Phase::Running => remaining.max(0),
                        _ => remaining,
                    };
                }
                (index, record)
            })
            .collect()
    }

    /// Replace all state with an imported record set. Every house is
    /// first reset to idle, then records in range are restored; records
    /// for unknown indexes are skipped with a warning. Returns the
    /// number of records applied.
    pub fn import_all(
        &mut self,
        records: &BTreeMap<usize, TimerRecord>,
        now: EpochMillis,
    ) -> Result<usize, WardenError> {
        let initial = self.policy.initial_duration_seconds;
        for timer in &mut self.houses {
            timer.reset_to_idle(initial);
        }

        let mut applied = 0;
        for (index, record) in records {
            let house = match HouseId::new(*index, self.houses.len()) {
                Ok(house) => house,
                Err(_) => {
                    warn!(index, "imported record for unknown house, skipping");
                    continue;
                }
            };
            self.restore(house, record, now)?;
            applied += 1;
        }

        // Bulk-write the full post-import state so houses absent from
        // the import are persisted as idle too.
        let snapshot: BTreeMap<usize, TimerRecord> = self
            .houses
            .iter()
            .enumerate()
            .map(|(index, timer)| (index, timer.to_record()))
            .collect();
        if let Err(err) = self.store.save_all(&snapshot) {
            warn!(%err, "could not persist imported state");
        }

        info!(applied, "import complete");
        Ok(applied)
    }

    /// Write one house's record. Persistence failures are logged and
    /// tolerated so one bad write never takes down the tick loop.
    fn persist(&self, house: HouseId) {
        let record = self.houses[house.index()].to_record();
        if let Err(err) = self.store.save(house, &record) {
            warn!(house = %house, %err, "persist failed");
        }
    }
}
