//! Events emitted by the timer engine

use warden_api::{AlertKind, Phase};
use warden_util::HouseId;

/// Events emitted by the engine for the presentation collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A house's displayed remaining value changed. Negative means
    /// overtime.
    DisplayUpdated {
        house: HouseId,
        remaining_seconds: i64,
    },

    /// A house entered a new phase.
    PhaseChanged { house: HouseId, phase: Phase },

    /// A one-shot alert fired.
    Alert { house: HouseId, kind: AlertKind },

    /// A bulk stop finished.
    AllStopped { stopped: usize },
}
