//! SQLite-based store implementation

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};
use warden_api::TimerRecord;
use warden_util::HouseId;

use crate::{Store, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- One snapshot per house, replaced on every save
            CREATE TABLE IF NOT EXISTS house_state (
                house INTEGER PRIMARY KEY,
                record_json TEXT NOT NULL
            );
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    fn decode(house: usize, json: &str) -> Option<TimerRecord> {
        match serde_json::from_str::<TimerRecord>(json) {
            Ok(record) if record.is_plausible() => Some(record),
            Ok(_) => {
                warn!(house, "Discarding implausible stored record");
                None
            }
            Err(e) => {
                warn!(house, error = %e, "Discarding corrupt stored record");
                None
            }
        }
    }
}

impl Store for SqliteStore {
    fn save(&self, house: HouseId, record: &TimerRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let json = serde_json::to_string(record)?;

        conn.execute(
            "INSERT OR REPLACE INTO house_state (house, record_json) VALUES (?, ?)",
            params![house.index() as i64, json],
        )?;

        Ok(())
    }

    fn load(&self, house: HouseId) -> StoreResult<Option<TimerRecord>> {
        let conn = self.conn.lock().unwrap();

        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM house_state WHERE house = ?",
                params![house.index() as i64],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.and_then(|j| Self::decode(house.index(), &j)))
    }

    fn delete(&self, house: HouseId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM house_state WHERE house = ?",
            params![house.index() as i64],
        )?;
        Ok(())
    }

    fn load_all(&self) -> StoreResult<BTreeMap<usize, TimerRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt =
            conn.prepare("SELECT house, record_json FROM house_state ORDER BY house")?;
        let rows = stmt.query_map([], |row| {
            let house: i64 = row.get(0)?;
            let json: String = row.get(1)?;
            Ok((house, json))
        })?;

        let mut records = BTreeMap::new();
        for row in rows {
            let (house, json) = row?;
            if house < 0 {
                warn!(house, "Skipping record with negative house index");
                continue;
            }
            let house = house as usize;
            if let Some(record) = Self::decode(house, &json) {
                records.insert(house, record);
            }
        }

        Ok(records)
    }

    fn save_all(&self, records: &BTreeMap<usize, TimerRecord>) -> StoreResult<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut written = 0;
        for (house, record) in records {
            let json = serde_json::to_string(record)?;
            tx.execute(
                "INSERT OR REPLACE INTO house_state (house, record_json) VALUES (?, ?)",
                params![*house as i64, json],
            )?;
            written += 1;
        }

        tx.commit()?;
        Ok(written)
    }

    fn is_healthy(&self) -> bool {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
    }
}
