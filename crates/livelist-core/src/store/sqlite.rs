//! SQLite-backed object store.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, error};

use super::execute::apply_fetch_request;
use super::traits::{ObjectStore, Record};
use crate::config::StoreConfig;
use crate::error::{LiveListError, Result};
use crate::query::{EntityDescription, FetchRequest};

/// Object store keeping each object as a JSON row in SQLite.
///
/// Thread-safe via an internal mutex on the connection.
#[derive(Debug)]
pub struct SqliteStore {
    db_path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create or open a store at the given path.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LiveListError::io_with_path(e, parent))?;
            }
        }

        let conn = Connection::open(&db_path).map_err(|e| LiveListError::Database {
            message: format!("Failed to open store database: {}", e),
            source: Some(e),
        })?;
        conn.execute_batch(StoreConfig::FILE_PRAGMAS)?;

        Self::from_connection(conn, Some(db_path))
    }

    /// Create a store that lives only as long as this value.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(StoreConfig::BUSY_TIMEOUT)?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS objects (
                entity TEXT NOT NULL,
                id TEXT NOT NULL,
                data_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (entity, id)
            );

            CREATE INDEX IF NOT EXISTS idx_objects_entity ON objects(entity);
            "#,
        )
        .map_err(|e| LiveListError::Database {
            message: format!("Failed to initialize store schema: {}", e),
            source: Some(e),
        })?;
        Ok(())
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LiveListError::LockPoisoned("store connection".to_string()))
    }

    /// Make an entity known to the store. Idempotent.
    pub fn register_entity(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO entities (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;
        debug!("Registered entity: {}", name);
        Ok(())
    }

    /// Insert or replace an object of a registered entity.
    pub fn upsert<S: Serialize>(&self, entity: &str, id: &str, value: &S) -> Result<()> {
        let data_json = serde_json::to_string(value)?;
        let conn = self.lock()?;
        Self::require_entity(&conn, entity)?;

        // Replacing in place keeps the original rowid, and with it the
        // object's position in unsorted fetches.
        conn.execute(
            "INSERT INTO objects (entity, id, data_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(entity, id) DO UPDATE SET
                 data_json=excluded.data_json,
                 updated_at=excluded.updated_at",
            params![entity, id, data_json, Utc::now().to_rfc3339()],
        )?;

        debug!("Upserted {} object: {}", entity, id);
        Ok(())
    }

    /// Delete an object. Returns whether it existed.
    pub fn delete(&self, entity: &str, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM objects WHERE entity = ?1 AND id = ?2",
            params![entity, id],
        )?;
        Ok(deleted > 0)
    }

    /// Number of stored objects of an entity.
    pub fn count(&self, entity: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM objects WHERE entity = ?1",
            params![entity],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn require_entity(conn: &Connection, entity: &str) -> Result<()> {
        let known = conn
            .query_row(
                "SELECT name FROM entities WHERE name = ?1",
                params![entity],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match known {
            Some(_) => Ok(()),
            None => Err(LiveListError::EntityNotFound {
                entity: entity.to_string(),
            }),
        }
    }

    fn load_records(conn: &Connection, entity: &str) -> Result<Vec<Record>> {
        let mut stmt = conn.prepare(
            "SELECT id, data_json FROM objects WHERE entity = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![entity], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, data_json) = row?;
            let data = serde_json::from_str(&data_json).map_err(|e| LiveListError::Decode {
                entity: entity.to_string(),
                id: id.clone(),
                message: e.to_string(),
            })?;
            records.push(Record { id, data });
        }
        Ok(records)
    }
}

impl ObjectStore for SqliteStore {
    fn entity_description(&self, entity_name: &str) -> Option<EntityDescription> {
        let conn = match self.lock() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Entity lookup for {} failed: {}", entity_name, e);
                return None;
            }
        };
        match Self::require_entity(&conn, entity_name) {
            Ok(()) => Some(EntityDescription::new(entity_name)),
            Err(LiveListError::EntityNotFound { .. }) => None,
            Err(e) => {
                error!("Entity lookup for {} failed: {}", entity_name, e);
                None
            }
        }
    }

    fn execute_fetch(&self, request: &FetchRequest) -> Result<Vec<Record>> {
        let start = Instant::now();
        let entity = request
            .entity_name()
            .ok_or_else(|| LiveListError::EntityNotFound {
                entity: "<unspecified>".to_string(),
            })?;

        let conn = self.lock()?;
        Self::require_entity(&conn, entity)?;
        let records = Self::load_records(&conn, entity)?;
        drop(conn);

        let scanned = records.len();
        let matched = apply_fetch_request(request, records);
        debug!(
            "Fetched {} of {} {} objects in {:.2}ms",
            matched.len(),
            scanned,
            entity,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(matched)
    }
}
