// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Persistent color-tag index keyed by absolute file path

pub mod color;

pub use color::TagColor;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

use crate::files::absolute;
use crate::{PixcullError, Result};

/// Tag index handle (thread-safe, cheap to clone)
///
/// Every clone shares one SQLite connection. Each operation is a single
/// statement or one short transaction, so callers serialize on the handle.
#[derive(Clone)]
pub struct TagIndex {
    conn: Arc<Mutex<Connection>>,
}

/// One row of `file_tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub file_path: String,
    pub tag_key: String,
    pub tag_name: String,
    pub tag_color: String,
    pub created_at: String,
}

impl TagRecord {
    /// Color for the stored key, if it is still a recognized one
    pub fn color(&self) -> Option<TagColor> {
        TagColor::from_key(&self.tag_key)
    }
}

/// Filter for [`TagIndex::list_files_by_tag`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    All,
    Key(TagColor),
    Name(String),
}

impl TagFilter {
    /// Build a filter from optional key and name; the key wins when both are given
    pub fn from_options(key: Option<&str>, name: Option<&str>) -> Result<Self> {
        match (key, name) {
            (Some(k), _) => Ok(TagFilter::Key(k.parse()?)),
            (None, Some(n)) => Ok(TagFilter::Name(
                TagColor::from_name(n)
                    .map(|color| color.name().to_string())
                    .unwrap_or_else(|| n.to_string()),
            )),
            (None, None) => Ok(TagFilter::All),
        }
    }
}

/// Store key for a path: its normalized absolute form. Non-UTF-8 paths are
/// rejected so that two distinct paths never share a key.
fn path_key(path: &Path) -> Result<String> {
    let path = absolute(path);
    match path.to_str() {
        Some(key) => Ok(key.to_string()),
        None => Err(PixcullError::InvalidPath(path)),
    }
}

impl TagIndex {
    /// Open or create the tag store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        index.initialize()?;
        info!("Tag index opened: {:?}", path);
        Ok(index)
    }

    /// Open an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        index.initialize()?;
        Ok(index)
    }

    /// Close the store. The connection stays open while other clones exist.
    pub fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex
                    .into_inner()
                    .map_err(|_| PixcullError::LockPoisoned("tag index"))?;
                conn.close().map_err(|(_, e)| PixcullError::Database(e))?;
                debug!("Tag index closed");
                Ok(())
            }
            Err(_) => {
                debug!("Tag index still shared, connection left open");
                Ok(())
            }
        }
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PixcullError::LockPoisoned("tag index"))
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS file_tags (
                file_path TEXT PRIMARY KEY,
                tag_key TEXT,
                tag_name TEXT,
                tag_color TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_file_tags_key ON file_tags(tag_key);
        "#,
        )?;
        Ok(())
    }

    /// Tag a file, replacing any tag it already has
    pub fn set_tag<P: AsRef<Path>>(&self, path: P, color: TagColor) -> Result<()> {
        let file_path = path_key(path.as_ref())?;
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT OR REPLACE INTO file_tags (file_path, tag_key, tag_name, tag_color)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![file_path, color.key(), color.name(), color.color()],
        )?;
        debug!("Tagged {} as {}", file_path, color);
        Ok(())
    }

    /// Tag a file by raw key, rejecting unknown keys before touching the store
    pub fn set_tag_key<P: AsRef<Path>>(&self, path: P, key: &str) -> Result<TagColor> {
        let color: TagColor = key.parse()?;
        self.set_tag(path, color)?;
        Ok(color)
    }

    /// Look up the tag for a file
    pub fn get_tag<P: AsRef<Path>>(&self, path: P) -> Result<Option<TagRecord>> {
        let file_path = path_key(path.as_ref())?;
        let conn = self.lock_conn()?;
        let record = conn
            .query_row(
                r#"SELECT file_path, tag_key, tag_name, tag_color, created_at
                   FROM file_tags WHERE file_path = ?1"#,
                params![file_path],
                |row| {
                    Ok(TagRecord {
                        file_path: row.get(0)?,
                        tag_key: row.get(1)?,
                        tag_name: row.get(2)?,
                        tag_color: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Remove a file's tag. Removing an untagged path also succeeds.
    pub fn remove_tag<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file_path = path_key(path.as_ref())?;
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM file_tags WHERE file_path = ?1", params![file_path])?;
        debug!("Removed {} tag row(s) for {}", removed, file_path);
        Ok(())
    }

    /// Paths carrying a tag, optionally filtered by key or name
    pub fn list_files_by_tag(&self, filter: &TagFilter) -> Result<Vec<String>> {
        let (sql, value) = match filter {
            TagFilter::Key(color) => (
                "SELECT file_path FROM file_tags WHERE tag_key = ?1 ORDER BY file_path",
                Some(color.key().to_string()),
            ),
            TagFilter::Name(name) => (
                "SELECT file_path FROM file_tags WHERE tag_name = ?1 ORDER BY file_path",
                Some(name.clone()),
            ),
            TagFilter::All => ("SELECT file_path FROM file_tags ORDER BY file_path", None),
        };

        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let paths = match value {
            Some(v) => stmt
                .query_map(params![v], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?,
            None => stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?,
        };
        Ok(paths)
    }

    /// Number of tagged files
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM file_tags", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Drop rows whose file no longer exists on disk; returns how many were removed
    pub fn cleanup(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let paths: Vec<String> = {
            let mut stmt = conn.prepare("SELECT file_path FROM file_tags")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let tx = conn.unchecked_transaction()?;
        let mut removed = 0;
        {
            let mut delete = tx.prepare("DELETE FROM file_tags WHERE file_path = ?1")?;
            for path in paths.iter().filter(|p| !Path::new(p.as_str()).exists()) {
                removed += delete.execute(params![path])?;
            }
        }
        tx.commit()?;

        info!("Tag cleanup removed {} stale record(s)", removed);
        Ok(removed)
    }
}
