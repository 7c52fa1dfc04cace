// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! pixcull: scan, color-tag and soft-delete image files
//!
//! A background scanner streams image metadata to a single consumer, a
//! SQLite-backed index keeps one color tag per file, and unwanted files are
//! moved into a staging area instead of being deleted.

pub mod config;
pub mod error;
pub mod files;
pub mod scanner;
pub mod sources;
pub mod staging;
pub mod tags;

pub use config::AppConfig;
pub use error::{PixcullError, Result};
pub use scanner::{ScanEvent, ScanOptions, ScanResult, ScanStream, ScanView, Scanner};
pub use staging::StagingArea;
pub use tags::{TagColor, TagFilter, TagIndex, TagRecord};
