// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed-cadence sampling loop: gates, probe reads, change detection,
//! intensity scoring, conditional screenshot, and buffer admission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::Capture;
use crate::config::Config;
use crate::flush::Flusher;
use crate::probe::{idle_millis, Probe};
use crate::record::ActivityRecord;
use crate::ring::{FlushReason, RecordBuffer};
use crate::sparse::SparseCounter;

/// Intensity falls linearly from 1 to 0 over this many idle milliseconds.
const INTENSITY_RAMP_MS: f64 = 5000.0;

/// Minimum score that admits a record on input activity alone.
const SCORE_ADMIT_THRESHOLD: f64 = 0.1;

/// A record is admitted when this long has passed since the last completed
/// tick, so gaps (lock screen, game sessions) leave a boundary marker.
const HEARTBEAT_GAP: Duration = Duration::from_secs(5);

/// How often repeated screenshot failures are logged.
const CAPTURE_LOG_EVERY: u64 = 50;

/// Monotonic counters shared with the stats task. Plain relaxed atomics:
/// the readers only ever render a snapshot line.
#[derive(Debug, Default)]
pub struct SamplerStats {
    pub ticks_total: AtomicU64,
    pub ticks_skipped_game: AtomicU64,
    pub ticks_idle: AtomicU64,
    pub flushes: AtomicU64,
    pub records_pushed: AtomicU64,
}

/// Mutable per-tick state. Owned by the sampler task; never persisted.
#[derive(Debug, Default)]
struct SamplerState {
    last_window_handle: u64,
    last_window_title: String,
    last_process_name: String,
    last_input_tick: u32,
    last_tick_at: Option<Instant>,
    last_screenshot_at: Option<Instant>,
}

pub struct Sampler<P, C> {
    probe: P,
    capture: C,
    buffer: Arc<RecordBuffer>,
    flusher: Flusher,
    stats: Arc<SamplerStats>,
    session_id: String,
    tick_period: Duration,
    idle_threshold_ms: u64,
    screenshot_interval: Duration,
    state: SamplerState,
    capture_failures: SparseCounter,
}

impl<P: Probe, C: Capture> Sampler<P, C> {
    pub fn new(
        probe: P,
        capture: C,
        buffer: Arc<RecordBuffer>,
        flusher: Flusher,
        stats: Arc<SamplerStats>,
        session_id: String,
        config: &Config,
    ) -> Self {
        Self {
            probe,
            capture,
            buffer,
            flusher,
            stats,
            session_id,
            tick_period: config.tick_period(),
            idle_threshold_ms: config.idle_threshold_ms(),
            screenshot_interval: config.screenshot_interval(),
            state: SamplerState::default(),
            capture_failures: SparseCounter::new(CAPTURE_LOG_EVERY),
        }
    }

    /// Run the tick loop until cancelled. Ticks never overlap themselves; a
    /// tick stalled on a capacity-triggered drain simply skips the missed
    /// cadence points.
    pub async fn run(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            tick_ms = self.tick_period.as_millis() as u64,
            idle_threshold_ms = self.idle_threshold_ms,
            "sampler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        info!(ticks = self.stats.ticks_total.load(Ordering::Relaxed), "sampler stopped");
        Ok(())
    }

    /// One tick. No error escapes: every failure either degrades the tick or
    /// skips it.
    async fn tick(&mut self) {
        self.stats.ticks_total.fetch_add(1, Ordering::Relaxed);
        let wall_time = Utc::now();
        let now = Instant::now();

        // Game gate: a full-screen exclusive app means no probing at all.
        if self.probe.is_full_screen_game() {
            self.stats.ticks_skipped_game.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let system_tick = self.probe.system_tick();
        let input_tick = self.probe.last_input_tick();
        let idle_ms = idle_millis(system_tick, input_tick);
        let idle = idle_ms >= self.idle_threshold_ms;
        if idle {
            self.stats.ticks_idle.fetch_add(1, Ordering::Relaxed);
        }

        // No focused window (locked workstation, secure desktop): skip.
        let Some(handle) = self.probe.foreground_window() else {
            return;
        };
        let title = self.probe.window_title(handle);
        let (_thread_id, pid) = self.probe.thread_and_process_id(handle);
        let process_name = process_name_for(pid);

        let intensity = self.intensity(idle, idle_ms, input_tick);
        let screenshot = self.maybe_screenshot(idle, handle, now);

        let window_changed = handle != self.state.last_window_handle
            || title != self.state.last_window_title
            || process_name != self.state.last_process_name;
        let heartbeat_due =
            self.state.last_tick_at.is_none_or(|at| now.duration_since(at) > HEARTBEAT_GAP);
        let active = !idle && intensity > SCORE_ADMIT_THRESHOLD;

        if window_changed || heartbeat_due || active || screenshot.is_some() {
            let record = ActivityRecord::new(
                self.session_id.clone(),
                wall_time,
                process_name.clone(),
                title.clone(),
                handle,
                idle_ms,
                intensity,
                screenshot,
            );
            debug!(
                handle,
                title = %record.window_title,
                intensity,
                has_screenshot = record.screenshot_bytes.is_some(),
                "record admitted"
            );
            if self.buffer.add(record) {
                // High-water: drain on this task rather than contend with a
                // second writer. Sinks handle short blocking calls.
                self.flusher.flush(FlushReason::HighWater).await;
            }
        }

        self.state.last_window_handle = handle;
        self.state.last_window_title = title;
        self.state.last_process_name = process_name;
        self.state.last_input_tick = input_tick;
        self.state.last_tick_at = Some(now);
    }

    /// Input intensity in [0, 1]: zero while idle or when no input arrived
    /// since the previous tick, otherwise a linear ramp down over recency.
    fn intensity(&self, idle: bool, idle_ms: u64, input_tick: u32) -> f64 {
        if idle || input_tick == self.state.last_input_tick {
            return 0.0;
        }
        (1.0 - idle_ms as f64 / INTENSITY_RAMP_MS).max(0.0)
    }

    /// Screenshot gate: not idle and the configured interval has elapsed.
    /// Capture failures degrade the tick and are logged sparsely.
    fn maybe_screenshot(&mut self, idle: bool, handle: u64, now: Instant) -> Option<Vec<u8>> {
        if idle {
            return None;
        }
        let due = self
            .state
            .last_screenshot_at
            .is_none_or(|at| now.duration_since(at) >= self.screenshot_interval);
        if !due {
            return None;
        }

        let rect = self.probe.window_rect(handle);
        if rect.is_degenerate() {
            return None;
        }
        match self.capture.capture(rect) {
            Ok(bytes) => {
                self.state.last_screenshot_at = Some(now);
                Some(bytes)
            }
            Err(err) => {
                if self.capture_failures.should_log() {
                    warn!(
                        occurrences = self.capture_failures.count(),
                        "screenshot capture failed: {err:#}"
                    );
                }
                None
            }
        }
    }
}

/// Stable per-process name. A richer executable-name lookup can replace
/// this; downstream consumers only need the value to be stable per pid.
fn process_name_for(pid: u32) -> String {
    format!("PID_{pid}")
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
