use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use super::error::CatalogError;
use super::model::{Record, RecordId};
use super::store::CatalogBackend;

const SCHEMA_VERSION: i64 = 1;

const RECORD_TABLE_V_1: &str = "CREATE TABLE IF NOT EXISTS record (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    album_art TEXT NOT NULL,
    lyrics TEXT,
    story TEXT,
    photo BLOB,
    created_at INTEGER NOT NULL
)";
const RECORD_INDICES_V_1: &[&str] =
    &["CREATE INDEX IF NOT EXISTS record_created_index ON record (created_at, seq)"];

/// SQLite persistence for the catalog.
///
/// The connection is locked per call, only for the statements of that call.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CatalogError::StorageFailure(format!("creating {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened catalog database");
        Self::with_connection(conn)
    }

    /// A database that lives only as long as this backend.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CatalogError> {
        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.migrate()?;
        Ok(backend)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<(), CatalogError> {
        let conn = self.conn();
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version > SCHEMA_VERSION {
            return Err(CatalogError::StorageFailure(format!(
                "database schema version {version} is newer than supported {SCHEMA_VERSION}"
            )));
        }

        if version < SCHEMA_VERSION {
            conn.execute(RECORD_TABLE_V_1, [])?;
            for index in RECORD_INDICES_V_1 {
                conn.execute(index, [])?;
            }
            conn.execute(&format!("PRAGMA user_version = {SCHEMA_VERSION}"), [])?;
            info!(from = version, to = SCHEMA_VERSION, "catalog schema migrated");
        }
        Ok(())
    }
}

fn exists(conn: &Connection, id: RecordId) -> Result<bool, CatalogError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM record WHERE id = ?1",
            params![id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    let id: String = row.get("id")?;
    let id = id.parse::<RecordId>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let millis: i64 = row.get("created_at")?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(millis).ok_or(
        rusqlite::Error::IntegralValueOutOfRange(8, millis),
    )?;

    Ok(Record {
        id,
        title: row.get("title")?,
        artist: row.get("artist")?,
        album_art: row.get("album_art")?,
        lyrics: row.get("lyrics")?,
        story: row.get("story")?,
        photo: row.get("photo")?,
        created_at,
    })
}

impl CatalogBackend for SqliteBackend {
    fn load_all(&self) -> Result<Vec<Record>, CatalogError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, artist, album_art, lyrics, story, photo, created_at
             FROM record ORDER BY created_at ASC, seq ASC",
        )?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn insert(&self, record: &Record) -> Result<(), CatalogError> {
        self.conn().execute(
            "INSERT INTO record (id, title, artist, album_art, lyrics, story, photo, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.title,
                record.artist,
                record.album_art,
                record.lyrics,
                record.story,
                record.photo,
                record.created_at.timestamp_millis(),
            ],
        )?;
        debug!(id = %record.id, "inserted record row");
        Ok(())
    }

    fn update(&self, record: &Record) -> Result<(), CatalogError> {
        let changed = self.conn().execute(
            "UPDATE record SET title = ?2, artist = ?3, album_art = ?4, lyrics = ?5,
             story = ?6, photo = ?7 WHERE id = ?1",
            params![
                record.id.to_string(),
                record.title,
                record.artist,
                record.album_art,
                record.lyrics,
                record.story,
                record.photo,
            ],
        )?;
        if changed == 0 {
            return Err(CatalogError::NotFound(record.id));
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> Result<(), CatalogError> {
        let conn = self.conn();
        if !exists(&conn, id)? {
            return Err(CatalogError::NotFound(id));
        }
        conn.execute("DELETE FROM record WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }
}
