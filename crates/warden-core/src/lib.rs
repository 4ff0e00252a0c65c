//! Timer engine and per-house state machine for wardend
//!
//! This crate is the heart of wardend, containing:
//! - The per-house state machine (Idle -> Running -> Overtime -> Idle)
//! - Timestamp-derived remaining computation (drift-free under
//!   arbitrary evaluation gaps)
//! - One-shot alert edge detection
//! - Snapshot persistence and reload-time recovery

mod engine;
mod events;
mod timer;

pub use engine::*;
pub use events::*;
pub use timer::*;
