// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event record emitted by the sampler and drained into a sink.

use chrono::{DateTime, SecondsFormat, Utc};

/// Sentinel stored in the screenshot-path column when the JPEG payload
/// travels in-band with the record instead of living on disk.
pub const SCREENSHOT_IN_MEMORY: &str = "RAM";

/// Conservative fixed overhead per record for byte accounting, covering the
/// struct itself plus allocation slack.
const RECORD_OVERHEAD: usize = 128;

/// One observation of the foreground window. Immutable after construction.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    /// Per-process-run id; identical across all records of one run.
    pub session_id: String,
    /// Captured at tick entry, millisecond precision.
    pub wall_time: DateTime<Utc>,
    /// Best-effort owning-process identifier (`PID_<n>` placeholder).
    pub process_name: String,
    /// Foreground window title, truncated upstream by the probe.
    pub window_title: String,
    /// Opaque OS handle, used only for change detection.
    pub window_handle: u64,
    /// Milliseconds since the last input event at tick time.
    pub idle_ms: u64,
    /// Derived input score in [0, 1].
    pub input_intensity: f64,
    /// In-memory JPEG, present only when the capture gate fired.
    pub screenshot_bytes: Option<Vec<u8>>,
    /// Set iff `screenshot_bytes` is present.
    pub screenshot_marker: Option<&'static str>,
}

impl ActivityRecord {
    /// Build a record, clamping the intensity into [0, 1] and deriving the
    /// screenshot marker from the presence of the payload.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        wall_time: DateTime<Utc>,
        process_name: String,
        window_title: String,
        window_handle: u64,
        idle_ms: u64,
        input_intensity: f64,
        screenshot_bytes: Option<Vec<u8>>,
    ) -> Self {
        let screenshot_marker = screenshot_bytes.as_ref().map(|_| SCREENSHOT_IN_MEMORY);
        Self {
            session_id,
            wall_time,
            process_name,
            window_title,
            window_handle,
            idle_ms,
            input_intensity: input_intensity.clamp(0.0, 1.0),
            screenshot_bytes,
            screenshot_marker,
        }
    }

    /// Wall time as unix seconds.
    pub fn unix_time(&self) -> i64 {
        self.wall_time.timestamp()
    }

    /// Wall time rendered as RFC 3339 UTC with millisecond precision.
    pub fn timestamp_utc(&self) -> String {
        self.wall_time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Conservative size estimate for buffer byte accounting.
    pub fn approx_size(&self) -> usize {
        RECORD_OVERHEAD
            + self.session_id.len()
            + self.process_name.len()
            + self.window_title.len()
            + self.screenshot_bytes.as_ref().map_or(0, Vec::len)
    }
}

/// Generate the opaque per-run session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
