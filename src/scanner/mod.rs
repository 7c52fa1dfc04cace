// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Background image scanner
//!
//! A scan walks the whole tree first, then reads metadata for image files on a
//! fixed-size worker pool. Results go into a bounded channel in completion
//! order, followed by exactly one [`ScanEvent::Finished`] marker.

pub mod stream;
pub mod view;

pub use stream::ScanStream;
pub use view::{DrainStep, ScanSummary, ScanView};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use walkdir::WalkDir;

use crate::files::{absolute, is_dir, is_image, normalize_extensions, FileInfo, DEFAULT_IMAGE_EXTENSIONS};
use crate::tags::TagIndex;

/// Marker shown next to files that carry a tag
pub const TAG_MARK: &str = "★";

/// Scanner settings
#[derive(Debug, Clone)]
pub struct ScanOptions {
    extensions: Vec<String>,
    workers: usize,
    batch_size: usize,
    channel_capacity: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: normalize_extensions(DEFAULT_IMAGE_EXTENSIONS),
            workers: default_workers(),
            batch_size: 50,
            channel_capacity: 1024,
        }
    }
}

fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl ScanOptions {
    pub fn with_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.extensions = normalize_extensions(extensions);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// One image file found by a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub size_display: String,
    pub modified_at: String,
    /// [`TAG_MARK`] when the file is tagged, empty otherwise
    pub tag_mark: String,
    /// Percentage of listed files accounted for when this result was queued
    pub progress: f64,
    pub ordinal: usize,
    pub total: usize,
}

impl ScanResult {
    fn new(info: FileInfo, tagged: bool, ordinal: usize, total: usize) -> Self {
        let progress = if total == 0 {
            100.0
        } else {
            ordinal as f64 / total as f64 * 100.0
        };
        Self {
            path: info.path,
            file_name: info.file_name,
            size_bytes: info.size_bytes,
            size_display: info.size_display,
            modified_at: info.modified_at,
            tag_mark: if tagged { TAG_MARK.to_string() } else { String::new() },
            progress,
            ordinal,
            total,
        }
    }

    pub fn is_tagged(&self) -> bool {
        !self.tag_mark.is_empty()
    }
}

/// Item delivered to the scan consumer
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Found(ScanResult),
    /// End of stream; always the last event of a scan
    Finished { found: usize },
}

impl ScanEvent {
    pub fn is_finished(&self) -> bool {
        matches!(self, ScanEvent::Finished { .. })
    }
}

/// Starts scans and hands back their result streams
#[derive(Clone)]
pub struct Scanner {
    options: ScanOptions,
    tags: Option<TagIndex>,
}

impl Scanner {
    /// Create a scanner; `tags` is consulted read-only to mark tagged files
    pub fn new(options: ScanOptions, tags: Option<TagIndex>) -> Self {
        Self { options, tags }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Start scanning `root` on a background thread.
    ///
    /// A missing or unreadable root produces no results, only the marker.
    pub fn start_scan<P: AsRef<Path>>(&self, root: P) -> ScanStream {
        let (tx, rx) = mpsc::channel(self.options.channel_capacity);
        let root = absolute(root.as_ref());
        let options = self.options.clone();
        let tags = self.tags.clone();

        let spawned = thread::Builder::new()
            .name("pixcull-scan".to_string())
            .spawn(move || run_scan(&root, &options, tags.as_ref(), tx));
        if let Err(e) = spawned {
            error!("Failed to start scan thread: {}", e);
        }

        ScanStream::new(rx, self.options.batch_size)
    }
}

/// List every non-directory entry under `root` as (directory, file name).
/// Symlinks are not followed; a symlink to a directory is skipped.
fn collect_candidates(root: &Path) -> Vec<(PathBuf, String)> {
    if !is_dir(root) {
        warn!("Scan root {:?} is missing or not a directory; reporting no files", root);
        return Vec::new();
    }

    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                trace!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        // a link to a directory counts as a directory, not a file
        .filter(|entry| !(entry.path_is_symlink() && is_dir(entry.path())))
        .filter_map(|entry| {
            let dir = entry.path().parent()?.to_path_buf();
            let name = entry.file_name().to_string_lossy().into_owned();
            Some((dir, name))
        })
        .collect()
}

fn run_scan(
    root: &Path,
    options: &ScanOptions,
    tags: Option<&TagIndex>,
    tx: mpsc::Sender<ScanEvent>,
) {
    let started = Instant::now();
    let candidates = collect_candidates(root);
    let total = candidates.len();
    info!("Scanning {:?}: {} files listed", root, total);

    let emitter = Emitter::new(tx, total);
    let process = |(dir, name): &(PathBuf, String)| {
        process_candidate(dir, name, options, tags, &emitter)
    };

    match rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("pixcull-worker-{}", i))
        .build()
    {
        Ok(pool) => pool.install(|| candidates.par_iter().for_each(process)),
        Err(e) => {
            warn!("Worker pool unavailable ({}), scanning on one thread", e);
            candidates.iter().for_each(process);
        }
    }

    let found = emitter.finish();
    info!(
        "Scan of {:?} finished in {:.2}s: {} image files",
        root,
        started.elapsed().as_secs_f64(),
        found
    );
}

fn process_candidate(
    dir: &Path,
    name: &str,
    options: &ScanOptions,
    tags: Option<&TagIndex>,
    emitter: &Emitter,
) {
    if !is_image(name, &options.extensions) {
        return;
    }

    let path = dir.join(name);
    let info = match FileInfo::read(&path) {
        Ok(info) => info,
        Err(e) => {
            trace!("Skipping {:?}: {}", path, e);
            return;
        }
    };

    let tagged = match tags.map(|index| index.get_tag(&path)) {
        Some(Ok(record)) => record.is_some(),
        Some(Err(e)) => {
            warn!("Tag lookup failed for {:?}: {}", path, e);
            false
        }
        None => false,
    };

    emitter.emit(info, tagged);
}

/// Serializes appends so ordinals follow queue order
struct Emitter {
    state: Mutex<EmitState>,
    total: usize,
}

struct EmitState {
    tx: mpsc::Sender<ScanEvent>,
    processed: usize,
    open: bool,
}

impl Emitter {
    fn new(tx: mpsc::Sender<ScanEvent>, total: usize) -> Self {
        Self {
            state: Mutex::new(EmitState {
                tx,
                processed: 0,
                open: true,
            }),
            total,
        }
    }

    fn emit(&self, info: FileInfo, tagged: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.open {
            return;
        }
        let ordinal = state.processed + 1;
        let result = ScanResult::new(info, tagged, ordinal, self.total);
        if state.tx.blocking_send(ScanEvent::Found(result)).is_err() {
            debug!("Scan consumer went away; discarding remaining results");
            state.open = false;
            return;
        }
        state.processed = ordinal;
    }

    /// Queue the end-of-stream marker and return the number of results sent
    fn finish(self) -> usize {
        let state = self.state.into_inner().unwrap_or_else(|e| e.into_inner());
        if state.open {
            let _ = state.tx.blocking_send(ScanEvent::Finished {
                found: state.processed,
            });
        }
        state.processed
    }
}
