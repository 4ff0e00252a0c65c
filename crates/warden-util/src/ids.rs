//! Strongly-typed identifiers for wardend

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Index of one tracked house, validated against the configured total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseId(usize);

impl HouseId {
    /// Build a HouseId, rejecting out-of-range indexes.
    pub fn new(index: usize, total: usize) -> crate::Result<Self> {
        if index < total {
            Ok(Self(index))
        } else {
            Err(crate::WardenError::InvalidHouse { index, total })
        }
    }

    /// Build without range validation. For iteration over 0..total only.
    pub fn from_index_unchecked(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for HouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one Running/Overtime segment of a house.
/// A fresh id is minted every time a house (re)starts, so ticks
/// scheduled against an ended segment can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(Uuid);

impl SegmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by `start`, required by `tick`. Pairs the house with
/// the segment it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentToken {
    pub house: HouseId,
    pub segment: SegmentId,
}

impl SegmentToken {
    pub fn new(house: HouseId, segment: SegmentId) -> Self {
        Self { house, segment }
    }
}

impl fmt::Display for SegmentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "house {} segment {}", self.house, self.segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn house_id_validates_range() {
        assert!(HouseId::new(0, 12).is_ok());
        assert!(HouseId::new(11, 12).is_ok());

        let err = HouseId::new(12, 12).unwrap_err();
        assert!(matches!(
            err,
            crate::WardenError::InvalidHouse { index: 12, total: 12 }
        ));
    }

    #[test]
    fn segment_id_uniqueness() {
        let a = SegmentId::new();
        let b = SegmentId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn house_id_serializes_as_plain_index() {
        let id = HouseId::new(3, 12).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "3");
        let parsed: HouseId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
