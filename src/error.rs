// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for pixcull

use thiserror::Error;

/// Result type alias for pixcull operations
pub type Result<T> = std::result::Result<T, PixcullError>;

/// pixcull error types
#[derive(Error, Debug)]
pub enum PixcullError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid tag key: {0:?} (expected 1-7)")]
    InvalidTagKey(String),

    #[error("Path is not valid UTF-8: {0:?}")]
    InvalidPath(std::path::PathBuf),

    #[error("Staging error: {0}")]
    Staging(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}
