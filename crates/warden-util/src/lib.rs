//! Shared utilities for wardend
//!
//! This crate provides:
//! - The `Clock` abstraction (system and manual implementations)
//! - ID types (HouseId, SegmentId, SegmentToken)
//! - Error types
//! - Display formatting helpers

mod clock;
mod error;
mod format;
mod ids;

pub use clock::*;
pub use error::*;
pub use format::*;
pub use ids::*;
