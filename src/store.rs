//! SQLite-backed persistence for managed switch configurations.
//!
//! The store holds two logical tables: a scalar migration marker
//! (`schema_version`, the bundled blueprint-set version last deployed) and
//! the managed switch configs keyed by id. It is read once at startup into
//! an in-memory cache; every mutation commits to disk before the cache is
//! touched and before the call returns, so the file is always the source of
//! truth across restarts.
//!
//! The file format itself is versioned with `PRAGMA user_version`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, Transaction, params};
use tracing::{debug, info, instrument, trace};

use crate::config::SwitchConfig;
use crate::error::{Result, SwmError};

/// Current on-disk format, stored in `PRAGMA user_version`.
pub const STORE_FORMAT_VERSION: i64 = 1;

const META_SCHEMA_VERSION: &str = "schema_version";
const META_LAST_ISSUED_ID: &str = "last_issued_id";

/// SQLite schema for the switch store.
const SCHEMA_SQL: &str = r"
-- Scalar markers (migration version, id counter)
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Managed switch configs, serialized as JSON
CREATE TABLE IF NOT EXISTS managed_switches (
    id TEXT PRIMARY KEY,
    config_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Durable store for switch configs and the migration marker.
pub struct SwitchStore {
    conn: Connection,
    schema_version: Option<String>,
    last_issued_id: u64,
    switches: BTreeMap<String, SwitchConfig>,
}

impl SwitchStore {
    /// Opens or creates the store file at `path`.
    ///
    /// A missing file starts an empty store. A file that exists but is not a
    /// readable store (corrupt, or written by a newer format) is an error.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SwmError::Storage(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        debug!(path = %path.display(), "Opening switch store");
        let conn = Connection::open(path)
            .map_err(|e| SwmError::Storage(format!("Failed to open store: {e}")))?;

        Self::with_connection(conn)
    }

    /// Creates an in-memory store (useful for testing).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SwmError::Storage(format!("Failed to create in-memory store: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn,
            schema_version: None,
            last_issued_id: 0,
            switches: BTreeMap::new(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Creates tables and stamps the format version.
    fn init_schema(&self) -> Result<()> {
        let format: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| SwmError::Storage(format!("Store unreadable: {e}")))?;

        if format > STORE_FORMAT_VERSION {
            return Err(SwmError::Storage(format!(
                "Store format {format} is newer than supported format {STORE_FORMAT_VERSION}"
            )));
        }

        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(|e| SwmError::Storage(format!("Failed to initialize schema: {e}")))?;

        if format < STORE_FORMAT_VERSION {
            debug!(from = format, to = STORE_FORMAT_VERSION, "Stamping store format");
            self.conn
                .pragma_update(None, "user_version", STORE_FORMAT_VERSION)?;
        }
        Ok(())
    }

    /// Reads all persisted state into memory.
    #[instrument(skip(self))]
    pub fn load(&mut self) -> Result<()> {
        let mut schema_version = None;
        let mut last_issued_id = 0;
        {
            let mut stmt = self.conn.prepare("SELECT key, value FROM store_meta")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            for row in rows {
                let (key, value) = row?;
                match key.as_str() {
                    META_SCHEMA_VERSION => schema_version = Some(value),
                    META_LAST_ISSUED_ID => {
                        last_issued_id = value.parse().map_err(|_| {
                            SwmError::Storage(format!("Corrupt id counter: {value:?}"))
                        })?;
                    }
                    other => trace!(key = other, "Ignoring unknown store marker"),
                }
            }
        }

        let mut switches = BTreeMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT id, config_json FROM managed_switches ORDER BY id")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            for row in rows {
                let (id, json) = row?;
                let config: SwitchConfig = serde_json::from_str(&json).map_err(|e| {
                    SwmError::Storage(format!("Corrupt config for switch {id}: {e}"))
                })?;
                switches.insert(id, config);
            }
        }

        info!(
            schema_version = ?schema_version,
            switches = switches.len(),
            "Switch store loaded"
        );
        self.schema_version = schema_version;
        self.last_issued_id = last_issued_id;
        self.switches = switches;
        Ok(())
    }

    /// The stored migration marker, if any.
    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    /// True iff the stored migration marker equals `version`.
    pub fn compare_version(&self, version: &str) -> bool {
        self.schema_version.as_deref().map(str::trim) == Some(version.trim())
    }

    /// Persists a new migration marker.
    #[instrument(skip(self))]
    pub fn update_version(&mut self, version: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_meta(&tx, META_SCHEMA_VERSION, version)?;
        tx.commit()?;

        info!(version, "Stored schema version updated");
        self.schema_version = Some(version.to_string());
        Ok(())
    }

    /// All stored switch configs by id.
    pub fn get_managed_switches(&self) -> &BTreeMap<String, SwitchConfig> {
        &self.switches
    }

    /// Allocates a fresh switch id.
    ///
    /// Ids come from a persisted counter, so an id is never handed out twice
    /// for the life of the store file, even after the switch is deleted.
    #[instrument(skip(self))]
    pub fn get_available_id(&mut self) -> Result<String> {
        let highest_existing = self
            .switches
            .keys()
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let next = self
            .last_issued_id
            .max(highest_existing)
            .checked_add(1)
            .ok_or_else(|| SwmError::Storage("Switch id space exhausted".to_string()))?;

        let tx = self.conn.transaction()?;
        put_meta(&tx, META_LAST_ISSUED_ID, &next.to_string())?;
        tx.commit()?;

        self.last_issued_id = next;
        debug!(id = next, "Allocated switch id");
        Ok(next.to_string())
    }

    /// Inserts or replaces the config stored under `id`.
    #[instrument(skip(self, config), fields(name = %config.name))]
    pub fn set_managed_switch(&mut self, id: &str, config: &SwitchConfig) -> Result<()> {
        let json = serde_json::to_string(config)
            .map_err(|e| SwmError::Storage(format!("Failed to serialize switch {id}: {e}")))?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO managed_switches (id, config_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(id) DO UPDATE SET
                config_json = excluded.config_json,
                updated_at = excluded.updated_at",
            params![id, json, now],
        )?;
        tx.commit()?;

        debug!(id, "Stored managed switch");
        self.switches.insert(id.to_string(), config.clone());
        Ok(())
    }

    /// Removes the config stored under `id`. Unknown ids are a no-op.
    ///
    /// Returns whether a row was removed.
    #[instrument(skip(self))]
    pub fn delete_managed_switch(&mut self, id: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM managed_switches WHERE id = ?1", params![id])?;
        tx.commit()?;

        self.switches.remove(id);
        debug!(id, removed, "Deleted managed switch");
        Ok(removed > 0)
    }
}

fn put_meta(tx: &Transaction<'_>, key: &str, value: &str) -> Result<()> {
    tx.execute(
        "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}
