//! SQLite storage implementation.
//!
//! The column names match the layout used by earlier watcher versions so an
//! existing `seen_links.db` is upgraded in place rather than migrated.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{AppError, Result};
use crate::models::{Link, SeenLink};
use crate::storage::{LinkStore, TitleLookup};

const TABLE: &str = "seen_links";

/// Columns added after the first layout, with their types.
const LATE_COLUMNS: [(&str, &str); 2] = [("last_title", "TEXT"), ("last_changed_utc", "TEXT")];

/// SQLite-backed link store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        log::debug!("Opened store at {}", path.as_ref().display());
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::config(format!("Store lock poisoned: {e}")))
    }

    fn column_exists(conn: &Connection, column: &str) -> Result<bool> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({TABLE})"))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        for name in names {
            if name? == column {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }

    fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn seen_link_from_row(row: &Row<'_>) -> rusqlite::Result<SeenLink> {
        let first_seen: String = row.get(1)?;
        let last_changed: Option<String> = row.get(3)?;

        Ok(SeenLink {
            url: row.get(0)?,
            first_seen_utc: Self::parse_time(1, &first_seen)?,
            last_title: row.get(2)?,
            last_changed_utc: last_changed
                .as_deref()
                .map(|raw| Self::parse_time(3, raw))
                .transpose()?,
        })
    }
}

impl LinkStore for SqliteStore {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (
                url TEXT PRIMARY KEY,
                first_seen_utc TEXT NOT NULL,
                last_title TEXT,
                last_changed_utc TEXT
            )"
        ))?;

        for (column, col_type) in LATE_COLUMNS {
            if Self::column_exists(&conn, column)? {
                continue;
            }
            match conn.execute(
                &format!("ALTER TABLE {TABLE} ADD COLUMN {column} {col_type}"),
                [],
            ) {
                Ok(_) => log::info!("Added column {column} to {TABLE}"),
                // Already present (e.g. added concurrently); nothing to upgrade.
                Err(e) => log::debug!("Skipping column {column}: {e}"),
            }
        }
        Ok(())
    }

    fn known_urls(&self) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT url FROM {TABLE}"))?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(urls)
    }

    fn title(&self, url: &str) -> Result<TitleLookup> {
        let conn = self.lock()?;
        let row: Option<Option<String>> = conn
            .query_row(
                &format!("SELECT last_title FROM {TABLE} WHERE url = ?1"),
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match row {
            None => TitleLookup::Missing,
            Some(None) => TitleLookup::Untitled,
            Some(Some(title)) if title.is_empty() => TitleLookup::Untitled,
            Some(Some(title)) => TitleLookup::Title(title),
        })
    }

    fn record_title(&self, url: &str, title: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!("UPDATE {TABLE} SET last_title = ?1, last_changed_utc = ?2 WHERE url = ?3"),
            params![title, Self::now(), url],
        )?;
        Ok(())
    }

    fn insert_new_links(&self, links: &[Link]) -> Result<usize> {
        if links.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let now = Self::now();
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO {TABLE} (url, first_seen_utc, last_title, last_changed_utc)
                 VALUES (?1, ?2, ?3, NULL)"
            ))?;
            for link in links {
                inserted += stmt.execute(params![link.url, now, link.title])?;
            }
        }
        tx.commit()?;

        if inserted < links.len() {
            log::debug!(
                "{} of {} links were already stored",
                links.len() - inserted,
                links.len()
            );
        }
        Ok(inserted)
    }

    fn get(&self, url: &str) -> Result<Option<SeenLink>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT url, first_seen_utc, last_title, last_changed_utc
                     FROM {TABLE} WHERE url = ?1"
                ),
                params![url],
                Self::seen_link_from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SeenLink>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT url, first_seen_utc, last_title, last_changed_utc
             FROM {TABLE} ORDER BY first_seen_utc DESC, rowid ASC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map(params![limit as i64], Self::seen_link_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
