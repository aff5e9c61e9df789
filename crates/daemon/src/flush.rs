// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The drain path shared by the sampler's capacity branch, the timer
//! listener task, and the supervisor's final drain.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ring::{FlushReason, RecordBuffer};
use crate::sampler::SamplerStats;
use crate::sink::Sink;

/// Moves buffered records into the sink. Holds the only sink reference;
/// drains serialize on the sink mutex so there is never a second writer.
#[derive(Clone)]
pub struct Flusher {
    buffer: Arc<RecordBuffer>,
    sink: Arc<Mutex<Sink>>,
    stats: Arc<SamplerStats>,
}

impl Flusher {
    pub fn new(buffer: Arc<RecordBuffer>, sink: Arc<Mutex<Sink>>, stats: Arc<SamplerStats>) -> Self {
        Self { buffer, sink, stats }
    }

    /// Drain the buffer into the sink. A failed drain loses the batch
    /// (at-most-once on the embedded path); the error is logged, not
    /// retried, and the next flush admits fresh records.
    pub async fn flush(&self, reason: FlushReason) {
        let records = match reason {
            FlushReason::Shutdown => self.buffer.drain_final(),
            _ => self.buffer.drain(),
        };
        if records.is_empty() {
            return;
        }
        let count = records.len();

        let mut sink = self.sink.lock().await;
        match sink.drain(records).await {
            Ok(published) => {
                self.stats.flushes.fetch_add(1, Ordering::Relaxed);
                self.stats.records_pushed.fetch_add(published as u64, Ordering::Relaxed);
                debug!(reason = reason.as_str(), count, published, "buffer drained");
            }
            Err(err) => {
                warn!(reason = reason.as_str(), count, "drain failed, batch lost: {err:#}");
            }
        }
    }

    /// Listener for timer-triggered flush suggestions. Runs until shutdown
    /// or until the buffer closes its side of the channel.
    pub async fn run_listener(self, mut rx: mpsc::Receiver<FlushReason>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                reason = rx.recv() => match reason {
                    Some(reason) => self.flush(reason).await,
                    None => break,
                },
            }
        }
    }
}
