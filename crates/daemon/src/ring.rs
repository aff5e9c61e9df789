// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity in-memory queue of activity records.
//!
//! Single producer (the sampler) and single external drainer; mutations hold
//! a short mutex critical section. The high-water mark is reported to the
//! producer from [`RecordBuffer::add`]; the auto-flush timer fires into a
//! single-slot channel so pending notifications coalesce.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::record::ActivityRecord;

/// Why a drain is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The buffer reached its high-water mark.
    HighWater,
    /// The auto-flush timer elapsed with records still buffered.
    Timer,
    /// Final drain during shutdown.
    Shutdown,
}

impl FlushReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighWater => "high_water",
            Self::Timer => "timer",
            Self::Shutdown => "shutdown",
        }
    }
}

pub struct RecordBuffer {
    inner: Mutex<VecDeque<ActivityRecord>>,
    capacity: usize,
    high_water: usize,
    /// Oldest-record evictions forced by a full buffer.
    dropped: AtomicU64,
    timer_reset: watch::Sender<()>,
    timer_stop: CancellationToken,
}

impl RecordBuffer {
    /// Build the buffer and spawn its auto-flush timer task. The returned
    /// receiver is the flush channel: one slot, extra triggers dropped.
    ///
    /// `high_water` is clamped to `capacity`.
    pub fn new(
        capacity: usize,
        high_water: usize,
        flush_period: Duration,
    ) -> (Arc<Self>, mpsc::Receiver<FlushReason>) {
        let (flush_tx, flush_rx) = mpsc::channel(1);
        let (timer_reset, reset_rx) = watch::channel(());
        let timer_stop = CancellationToken::new();

        let buffer = Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            high_water: high_water.min(capacity).max(1),
            dropped: AtomicU64::new(0),
            timer_reset,
            timer_stop: timer_stop.clone(),
        });

        tokio::spawn(run_timer(flush_period, flush_tx, reset_rx, timer_stop, Arc::clone(&buffer)));

        (buffer, flush_rx)
    }

    /// Append a record. Returns `true` exactly when the stored count has
    /// reached the high-water mark, i.e. the caller should drain now.
    pub fn add(&self, record: ActivityRecord) -> bool {
        let mut inner = self.inner.lock();
        if inner.len() == self.capacity {
            inner.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        inner.push_back(record);
        inner.len() >= self.high_water
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Conservative byte estimate of buffered records.
    pub fn approx_bytes(&self) -> usize {
        self.inner.lock().iter().map(ActivityRecord::approx_size).sum()
    }

    /// Records evicted because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Atomically take the contents in admission order, leaving an empty
    /// re-capacitized buffer, and restart the auto-flush wait from now.
    pub fn drain(&self) -> Vec<ActivityRecord> {
        let records = self.take_all();
        let _ = self.timer_reset.send(());
        records
    }

    /// As [`RecordBuffer::drain`], for shutdown: also stops the timer task.
    pub fn drain_final(&self) -> Vec<ActivityRecord> {
        self.timer_stop.cancel();
        self.take_all()
    }

    fn take_all(&self) -> Vec<ActivityRecord> {
        let mut inner = self.inner.lock();
        let taken = std::mem::replace(&mut *inner, VecDeque::with_capacity(self.capacity));
        taken.into()
    }
}

/// Auto-flush timer: fires [`FlushReason::Timer`] into the flush channel
/// every `period` unless a drain resets the wait first. Skips the send when
/// the buffer is empty, since there is nothing to suggest flushing.
async fn run_timer(
    period: Duration,
    flush_tx: mpsc::Sender<FlushReason>,
    mut reset_rx: watch::Receiver<()>,
    stop: CancellationToken,
    buffer: Arc<RecordBuffer>,
) {
    loop {
        let deadline = tokio::time::Instant::now() + period;
        tokio::select! {
            _ = stop.cancelled() => break,
            changed = reset_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                // Drain completed; restart the wait.
            }
            _ = tokio::time::sleep_until(deadline) => {
                if !buffer.is_empty() {
                    // try_send: a pending notification coalesces this one.
                    if flush_tx.try_send(FlushReason::Timer).is_ok() {
                        debug!("auto-flush timer fired");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;
