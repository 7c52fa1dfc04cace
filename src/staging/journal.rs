// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Relocation journal: one JSON line per file moved into staging

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::Result;

/// A single move into the staging area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub original_path: PathBuf,
    pub staged_path: PathBuf,
    pub restored: bool,
}

impl Relocation {
    pub fn new(original_path: PathBuf, staged_path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            original_path,
            staged_path,
            restored: false,
        }
    }
}

pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one move at the end of the journal
    pub fn record(&self, entry: &Relocation) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())?;
        Ok(())
    }

    /// Every entry, oldest first. Lines that do not parse are skipped.
    pub fn entries(&self) -> Result<Vec<Relocation>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("{}:{}: unreadable journal line: {}", self.path.display(), n + 1, e);
                    None
                }
            })
            .collect())
    }

    /// Up to `limit` entries, newest first
    pub fn latest(&self, limit: usize) -> Result<Vec<Relocation>> {
        Ok(self.entries()?.into_iter().rev().take(limit).collect())
    }

    /// Entries not restored yet, newest first
    pub fn pending(&self) -> Result<Vec<Relocation>> {
        Ok(self
            .entries()?
            .into_iter()
            .rev()
            .filter(|e| !e.restored)
            .collect())
    }

    /// Flag the given entries as restored with a single rewrite of the
    /// journal; returns how many entries changed
    pub fn mark_restored(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut changed = 0;
        let mut content = String::new();
        for mut entry in self.entries()? {
            if !entry.restored && ids.contains(entry.id.as_str()) {
                entry.restored = true;
                changed += 1;
            }
            content.push_str(&serde_json::to_string(&entry)?);
            content.push('\n');
        }

        replace_file(&self.path, content.as_bytes())?;
        debug!("Marked {} journal entr(ies) restored", changed);
        Ok(changed)
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Write `content` to a temp file next to `path`, then rename it over `path`
fn replace_file(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_path = parent.join(format!(".journal_{}.tmp", uuid::Uuid::new_v4()));
    fs::write(&temp_path, content)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> Relocation {
        Relocation::new(PathBuf::from("/src").join(name), PathBuf::from("/cache").join(name))
    }

    #[test]
    fn test_record_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("log").join("relocations.jsonl"));
        assert!(journal.entries().unwrap().is_empty());

        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            journal.record(&entry(name)).unwrap();
        }

        let latest = journal.latest(2).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].original_path, PathBuf::from("/src/c.jpg"));
        assert_eq!(latest[1].original_path, PathBuf::from("/src/b.jpg"));
    }

    #[test]
    fn test_mark_restored_in_one_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("relocations.jsonl"));
        let (a, b, c) = (entry("a.jpg"), entry("b.jpg"), entry("c.jpg"));
        for e in [&a, &b, &c] {
            journal.record(e).unwrap();
        }
        fs::OpenOptions::new()
            .append(true)
            .open(journal.path())
            .unwrap()
            .write_all(b"not json\n")
            .unwrap();

        let changed = journal.mark_restored(&[a.id.clone(), c.id.clone()]).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(journal.mark_restored(&[a.id.clone()]).unwrap(), 0);

        let pending = journal.pending().unwrap();
        assert_eq!(pending, vec![b]);
        assert_eq!(journal.entries().unwrap().len(), 3);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("relocations.jsonl"));
        journal.record(&entry("a.jpg")).unwrap();

        journal.clear().unwrap();
        assert!(!journal.path().exists());
        journal.clear().unwrap();
        assert_eq!(journal.mark_restored(&[]).unwrap(), 0);
    }
}
