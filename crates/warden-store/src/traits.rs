//! Store trait definitions

use std::collections::BTreeMap;
use warden_api::TimerRecord;
use warden_util::HouseId;

use crate::StoreResult;

/// Main store trait
pub trait Store: Send + Sync {
    /// Save a house's snapshot, replacing any previous record.
    fn save(&self, house: HouseId, record: &TimerRecord) -> StoreResult<()>;

    /// Load the last snapshot for a house. A missing or corrupt record
    /// resolves to `Ok(None)`.
    fn load(&self, house: HouseId) -> StoreResult<Option<TimerRecord>>;

    /// Remove a house's record.
    fn delete(&self, house: HouseId) -> StoreResult<()>;

    /// Load every readable record, keyed by house index. Corrupt rows
    /// are skipped with a warning.
    fn load_all(&self) -> StoreResult<BTreeMap<usize, TimerRecord>>;

    /// Bulk-save records (import path). Returns the number written.
    fn save_all(&self, records: &BTreeMap<usize, TimerRecord>) -> StoreResult<usize>;

    /// Check if the store is healthy
    fn is_healthy(&self) -> bool;
}
