// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Consumer-side state for a scan: the result list, selection and marks

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{ScanEvent, ScanResult, ScanStream};

/// Outcome of applying one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStep {
    Continue,
    Finished { found: usize },
}

/// Totals reported once a scan has been drained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub found: usize,
    pub listed: usize,
    pub tagged: usize,
    /// False when the stream closed without its end marker
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Scanning,
    Complete,
}

/// Everything a presentation layer needs to show a scan
#[derive(Debug, Default)]
pub struct ScanView {
    results: Vec<ScanResult>,
    discovered: HashSet<PathBuf>,
    marked: HashSet<PathBuf>,
    selected: Option<PathBuf>,
    processed: usize,
    listed: usize,
    progress: f64,
    phase: Phase,
}

impl ScanView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new scan. Starting again and bulk delete stay disabled
    /// until the scan finishes.
    pub fn begin(&mut self) {
        *self = Self {
            phase: Phase::Scanning,
            ..Self::default()
        };
    }

    /// Apply one event from the scan stream
    pub fn apply(&mut self, event: ScanEvent) -> DrainStep {
        match event {
            ScanEvent::Found(result) => {
                self.processed = result.ordinal;
                self.listed = result.total;
                self.progress = result.progress;
                self.discovered.insert(result.path.clone());
                if result.is_tagged() {
                    self.marked.insert(result.path.clone());
                }
                if self.results.is_empty() {
                    self.selected = Some(result.path.clone());
                }
                self.results.push(result);
                DrainStep::Continue
            }
            ScanEvent::Finished { found } => {
                if found != self.results.len() {
                    warn!(
                        "Scan reported {} results but {} were received",
                        found,
                        self.results.len()
                    );
                }
                self.phase = Phase::Complete;
                self.progress = 100.0;
                info!("{}", self.status_line());
                DrainStep::Finished {
                    found: self.results.len(),
                }
            }
        }
    }

    /// Apply a batch; stops at the end marker
    pub fn apply_batch(&mut self, batch: Vec<ScanEvent>) -> DrainStep {
        for event in batch {
            if let step @ DrainStep::Finished { .. } = self.apply(event) {
                return step;
            }
        }
        DrainStep::Continue
    }

    /// Consume `stream` until its end marker
    pub async fn drain(&mut self, stream: &mut ScanStream) -> ScanSummary {
        if self.phase != Phase::Scanning {
            self.begin();
        }
        while let Some(batch) = stream.next_batch().await {
            debug!("Applying batch of {} scan events", batch.len());
            if let DrainStep::Finished { .. } = self.apply_batch(batch) {
                return self.summary(true);
            }
        }
        warn!("Scan stream closed before completion");
        self.summary(false)
    }

    /// Blocking variant of [`drain`](Self::drain), for use outside an async runtime
    pub fn blocking_drain(&mut self, stream: &mut ScanStream) -> ScanSummary {
        if self.phase != Phase::Scanning {
            self.begin();
        }
        while let Some(batch) = stream.blocking_next_batch() {
            if let DrainStep::Finished { .. } = self.apply_batch(batch) {
                return self.summary(true);
            }
        }
        warn!("Scan stream closed before completion");
        self.summary(false)
    }

    fn summary(&mut self, completed: bool) -> ScanSummary {
        if !completed {
            self.phase = Phase::Complete;
        }
        ScanSummary {
            found: self.results.len(),
            listed: self.listed,
            tagged: self.marked.len(),
            completed,
        }
    }

    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    /// Every path discovered by the current scan, including ones since removed
    pub fn discovered(&self) -> &HashSet<PathBuf> {
        &self.discovered
    }

    pub fn marked(&self) -> &HashSet<PathBuf> {
        &self.marked
    }

    pub fn is_marked(&self, path: &Path) -> bool {
        self.marked.contains(path)
    }

    pub fn mark(&mut self, path: &Path) {
        self.marked.insert(path.to_path_buf());
    }

    pub fn unmark(&mut self, path: &Path) {
        self.marked.remove(path);
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    /// Select a listed path; returns false if it is not in the view
    pub fn select(&mut self, path: &Path) -> bool {
        if self.results.iter().any(|r| r.path == path) {
            self.selected = Some(path.to_path_buf());
            true
        } else {
            false
        }
    }

    /// Move the selection to the next result, if any
    pub fn select_next(&mut self) -> Option<&Path> {
        let next = self.selected_index().map_or(0, |i| i + 1);
        if let Some(result) = self.results.get(next) {
            self.selected = Some(result.path.clone());
        }
        self.selected()
    }

    /// Move the selection to the previous result, if any
    pub fn select_prev(&mut self) -> Option<&Path> {
        if let Some(i) = self.selected_index() {
            if i > 0 {
                self.selected = Some(self.results[i - 1].path.clone());
            }
        }
        self.selected()
    }

    fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.results.iter().position(|r| &r.path == selected)
    }

    /// Drop relocated files from the list. A removed selection moves to the
    /// next remaining file, or the previous one at the end of the list.
    pub fn remove_paths(&mut self, paths: &[PathBuf]) {
        let removed: HashSet<&PathBuf> = paths.iter().collect();
        let selection_removed = self
            .selected
            .as_ref()
            .map_or(false, |s| removed.contains(s));
        let replacement = if selection_removed {
            self.selected_index().and_then(|i| {
                let kept = |r: &&ScanResult| !removed.contains(&r.path);
                self.results[i + 1..]
                    .iter()
                    .find(kept)
                    .or_else(|| self.results[..i].iter().rev().find(kept))
                    .map(|r| r.path.clone())
            })
        } else {
            self.selected.clone()
        };

        self.results.retain(|r| !removed.contains(&r.path));
        self.marked.retain(|p| !removed.contains(p));
        self.selected = replacement;
    }

    pub fn is_scanning(&self) -> bool {
        self.phase == Phase::Scanning
    }

    /// A new scan may start once the previous one has finished
    pub fn can_start_scan(&self) -> bool {
        self.phase != Phase::Scanning
    }

    /// Bulk delete is offered only after a scan found something
    pub fn can_delete(&self) -> bool {
        self.phase == Phase::Complete && !self.results.is_empty()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Human-readable progress line
    pub fn status_line(&self) -> String {
        match self.phase {
            Phase::Idle => "Idle".to_string(),
            Phase::Scanning => format!("Processed: {}/{}", self.processed, self.listed),
            Phase::Complete => format!("Scan complete, found {} image files", self.results.len()),
        }
    }
}
