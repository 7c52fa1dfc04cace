// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Soft-delete staging area
//!
//! Deleted images are moved here instead of being removed, and only vanish
//! for good on an explicit purge.

pub mod journal;

pub use journal::{Journal, Relocation};

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::StagingConfig;
use crate::files::{exists, file_name_of, move_file, remove_file};
use crate::{PixcullError, Result};

const THUMB_SUFFIX: &str = ".pic_thumb.jpg";
const ORIGINAL_SUFFIX: &str = ".pic.jpg";

/// Holding directory for soft-deleted files
pub struct StagingArea {
    dir: PathBuf,
    threshold: usize,
    journal: Journal,
}

/// Result of [`StagingArea::restore_recent`]
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: Vec<Relocation>,
    pub skipped: Vec<(Relocation, String)>,
}

impl StagingArea {
    /// Open (creating if needed) the staging directory
    pub fn open(dir: PathBuf, threshold: usize, journal_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        debug!("Staging area at {:?} (threshold {})", dir, threshold);
        Ok(Self {
            dir,
            threshold,
            journal: Journal::new(journal_path),
        })
    }

    pub fn from_config(config: &StagingConfig) -> Result<Self> {
        Self::open(
            config.dir.clone(),
            config.threshold,
            config.journal_path.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// First unused destination for `file_name`: `name.ext`, then `name_1.ext`, `name_2.ext`, ...
    pub fn free_destination(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let as_path = Path::new(file_name);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        let ext = as_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut counter = 1;
        loop {
            let candidate = self.dir.join(format!("{}_{}{}", stem, counter, ext));
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Move files into the staging area, stopping at the first failure.
    /// A move that cannot be journaled is undone before the error is returned.
    pub fn relocate<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<Relocation>> {
        let mut moved = Vec::with_capacity(paths.len());

        for path in paths {
            let path = path.as_ref();
            let destination = self.free_destination(&file_name_of(path));
            if let Err(e) = move_file(path, &destination) {
                return Err(PixcullError::Staging(format!(
                    "Failed to move {:?} to staging: {} ({} file(s) already moved)",
                    path,
                    e,
                    moved.len()
                )));
            }

            let entry = Relocation::new(path.to_path_buf(), destination);
            if let Err(e) = self.journal.record(&entry) {
                let rollback = match move_file(&entry.staged_path, path) {
                    Ok(()) => "moved back".to_string(),
                    Err(back) => {
                        warn!("Could not move {:?} back: {}", entry.staged_path, back);
                        format!("left at {:?}", entry.staged_path)
                    }
                };
                return Err(PixcullError::Staging(format!(
                    "Failed to journal move of {:?} ({}): {} ({} file(s) already moved)",
                    path,
                    rollback,
                    e,
                    moved.len()
                )));
            }
            debug!("Staged {:?} -> {:?}", entry.original_path, entry.staged_path);
            moved.push(entry);
        }

        info!("Moved {} file(s) to staging", moved.len());
        Ok(moved)
    }

    /// Files currently held, sorted by path
    pub fn staged_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn file_count(&self) -> Result<usize> {
        Ok(self.staged_files()?.len())
    }

    /// Whether enough files have piled up to suggest a purge
    pub fn threshold_reached(&self) -> Result<bool> {
        Ok(self.file_count()? >= self.threshold)
    }

    /// Permanently delete every staged file and forget their journal entries;
    /// returns how many were removed
    pub fn purge(&self) -> Result<usize> {
        let mut removed = 0;
        for file in self.staged_files()? {
            remove_file(&file).map_err(|e| {
                PixcullError::Staging(format!("Failed to delete {:?}: {}", file, e))
            })?;
            removed += 1;
        }
        self.journal.clear()?;
        info!("Purged {} staged file(s)", removed);
        Ok(removed)
    }

    /// Move the most recent `count` staged files back where they came from.
    /// The journal is updated once, after the moves.
    pub fn restore_recent(&self, count: usize, dry_run: bool) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();

        for entry in self.journal.pending()?.into_iter().take(count) {
            if !exists(&entry.staged_path) {
                report
                    .skipped
                    .push((entry, "staged file missing (purged?)".to_string()));
                continue;
            }
            if exists(&entry.original_path) {
                report
                    .skipped
                    .push((entry, "original path already exists".to_string()));
                continue;
            }
            if !dry_run {
                if let Err(e) = put_back(&entry) {
                    self.journal.mark_restored(&restored_ids(&report))?;
                    return Err(PixcullError::Staging(format!(
                        "Failed to restore {:?}: {} ({} file(s) already restored)",
                        entry.original_path,
                        e,
                        report.restored.len()
                    )));
                }
                info!("Restored {:?}", entry.original_path);
            }
            report.restored.push(entry);
        }

        if !dry_run {
            self.journal.mark_restored(&restored_ids(&report))?;
        }
        Ok(report)
    }
}

fn put_back(entry: &Relocation) -> std::io::Result<()> {
    if let Some(parent) = entry.original_path.parent() {
        fs::create_dir_all(parent)?;
    }
    move_file(&entry.staged_path, &entry.original_path)
}

fn restored_ids(report: &RestoreReport) -> Vec<String> {
    report.restored.iter().map(|e| e.id.clone()).collect()
}

/// Companion files that should travel with `path`: a `.pic.jpg` original and
/// its `.pic_thumb.jpg` thumbnail. Only companions present on disk are returned.
pub fn related_files(path: &Path) -> Vec<PathBuf> {
    let name = file_name_of(path);
    let companion = if let Some(base) = name.strip_suffix(THUMB_SUFFIX) {
        format!("{}{}", base, ORIGINAL_SUFFIX)
    } else if let Some(base) = name.strip_suffix(ORIGINAL_SUFFIX) {
        format!("{}{}", base, THUMB_SUFFIX)
    } else {
        return Vec::new();
    };

    let companion = path.with_file_name(companion);
    if exists(&companion) {
        vec![companion]
    } else {
        Vec::new()
    }
}

/// Expand a selection with its companion files, without duplicates
pub fn with_related(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        for candidate in std::iter::once(path.clone()).chain(related_files(path)) {
            if !expanded.contains(&candidate) {
                expanded.push(candidate);
            }
        }
    }
    expanded
}
