//! Event types streamed from wardend to presentation collaborators

use serde::{Deserialize, Serialize};
use warden_util::{EpochMillis, HouseId};

use crate::{AlertKind, Phase, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    /// Wall-clock timestamp the event was emitted at.
    pub timestamp_ms: EpochMillis,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload, now_ms: EpochMillis) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp_ms: now_ms,
            payload,
        }
    }
}

/// All events a collaborator can receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A house's displayed value changed. Negative seconds mean
    /// overtime; renderers show `MM:SS` with a `-` prefix and toggle
    /// their negative styling on `remaining_seconds < 0`.
    DisplayUpdated {
        house: HouseId,
        remaining_seconds: i64,
    },

    /// A house changed phase. Collaborators add or remove the
    /// restart/stop controls based on `phase != idle`.
    PhaseChanged { house: HouseId, phase: Phase },

    /// A one-shot alert fired for a house.
    Alert { house: HouseId, kind: AlertKind },

    /// A bulk stop finished; `stopped` houses were active.
    AllStopped { stopped: usize },

    /// Service is shutting down.
    Shutdown,
}
