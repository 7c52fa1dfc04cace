// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! File metadata helpers shared by the scanner and the staging area

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Extensions recognized as images when no configuration overrides them
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB"];

/// Metadata gathered for a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub size_display: String,
    pub modified_at: String,
}

impl FileInfo {
    /// Read size and modification time for `path`
    pub fn read(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let size_bytes = metadata.len();

        Ok(Self {
            path: path.to_path_buf(),
            file_name: file_name_of(path),
            size_bytes,
            size_display: format_size(size_bytes),
            modified_at: format_timestamp(modified),
        })
    }
}

/// Format a byte count with two decimals, stepping by 1024 up to TB
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

/// Format a timestamp as local `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Base name of a path, lossily converted
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Case-insensitive suffix match of `name` against the given extensions
pub fn is_image(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
}

/// Normalize extensions to lowercase with a leading dot
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty() && e != ".")
        .map(|e| if e.starts_with('.') { e } else { format!(".{}", e) })
        .collect()
}

/// Resolve `path` against the current directory and drop `.` and `..`
/// components lexically, without touching symlinks
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

pub fn exists(path: &Path) -> bool {
    path.exists()
}

pub fn is_dir(path: &Path) -> bool {
    path.is_dir()
}

/// Immediate children of a directory, sorted by path
pub fn list_children(path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut children: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    children.sort();
    Ok(children)
}

pub fn remove_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(unix)]
const EXDEV: i32 = libc::EXDEV;
// ERROR_NOT_SAME_DEVICE
#[cfg(not(unix))]
const EXDEV: i32 = 17;

/// Whether a rename failed only because source and destination are on different devices
pub fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(EXDEV)
}

/// Move a file. A rename across devices falls back to copy + remove; any
/// other rename failure is returned as is. If the source cannot be removed
/// after copying, the copy is deleted again.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) && from.is_file() => {
            debug!("{:?} and {:?} are on different devices, copying", from, to);
            fs::copy(from, to)?;
            if let Err(remove_err) = fs::remove_file(from) {
                if let Err(cleanup_err) = fs::remove_file(to) {
                    warn!("Could not remove partial copy {:?}: {}", to, cleanup_err);
                }
                return Err(remove_err);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
