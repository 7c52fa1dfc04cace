// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Consumer end of a scan

use tokio::sync::mpsc;

use super::ScanEvent;

/// Receives a scan's events in batches
///
/// Each call waits for at least one event, then takes whatever else is
/// already queued, up to the batch size. After the end-of-stream marker has
/// been handed out, every further call returns `None`.
pub struct ScanStream {
    rx: mpsc::Receiver<ScanEvent>,
    batch_size: usize,
    done: bool,
}

impl ScanStream {
    pub(crate) fn new(rx: mpsc::Receiver<ScanEvent>, batch_size: usize) -> Self {
        Self {
            rx,
            batch_size: batch_size.max(1),
            done: false,
        }
    }

    /// Whether the end of the stream has been reached
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Await the next batch of events
    pub async fn next_batch(&mut self) -> Option<Vec<ScanEvent>> {
        if self.done {
            return None;
        }
        match self.rx.recv().await {
            Some(first) => Some(self.fill_batch(first)),
            None => {
                self.done = true;
                None
            }
        }
    }

    /// Blocking variant of [`next_batch`](Self::next_batch).
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_next_batch(&mut self) -> Option<Vec<ScanEvent>> {
        if self.done {
            return None;
        }
        match self.rx.blocking_recv() {
            Some(first) => Some(self.fill_batch(first)),
            None => {
                self.done = true;
                None
            }
        }
    }

    /// Drain the whole stream into a vector
    pub async fn collect(mut self) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Some(batch) = self.next_batch().await {
            events.extend(batch);
        }
        events
    }

    fn fill_batch(&mut self, first: ScanEvent) -> Vec<ScanEvent> {
        let mut batch = Vec::with_capacity(self.batch_size.min(64));
        self.push(&mut batch, first);

        while !self.done && batch.len() < self.batch_size {
            match self.rx.try_recv() {
                Ok(event) => self.push(&mut batch, event),
                Err(_) => break,
            }
        }
        batch
    }

    fn push(&mut self, batch: &mut Vec<ScanEvent>, event: ScanEvent) {
        if event.is_finished() {
            self.done = true;
        }
        batch.push(event);
    }
}
