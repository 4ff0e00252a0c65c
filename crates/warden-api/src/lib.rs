//! Stable types shared between the wardend engine and its collaborators
//!
//! This crate defines:
//! - The house phase and alert kinds
//! - The event envelope streamed to presentation collaborators
//! - The persisted per-house record, bit-compatible with the original
//!   localStorage snapshots (`timer-<i>` keys)

mod events;
mod types;

pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
