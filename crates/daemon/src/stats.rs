// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic operational snapshot: counters, buffer occupancy, sink backlog,
//! and process memory.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::ring::RecordBuffer;
use crate::sampler::SamplerStats;
use crate::sink::Sink;

/// Emit one snapshot line every `period` until cancelled.
pub async fn run(
    stats: Arc<SamplerStats>,
    buffer: Arc<RecordBuffer>,
    sink: Arc<Mutex<Sink>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let started = tokio::time::Instant::now();
    let mut ticker = tokio::time::interval_at(started + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let (events_total, events_pending) = {
            let sink = sink.lock().await;
            match sink.event_counts() {
                Some(counts) => (counts.total, counts.pending),
                None => (0, 0),
            }
        };
        let (rss_bytes, vsize_bytes) = process_memory().unwrap_or((0, 0));

        info!(
            uptime_secs = started.elapsed().as_secs(),
            ticks = stats.ticks_total.load(Ordering::Relaxed),
            ticks_idle = stats.ticks_idle.load(Ordering::Relaxed),
            ticks_skipped_game = stats.ticks_skipped_game.load(Ordering::Relaxed),
            buffer_len = buffer.len(),
            buffer_bytes = buffer.approx_bytes(),
            buffer_dropped = buffer.dropped(),
            flushes = stats.flushes.load(Ordering::Relaxed),
            records_pushed = stats.records_pushed.load(Ordering::Relaxed),
            events_total,
            events_pending,
            rss_mib = rss_bytes / (1024 * 1024),
            vsize_mib = vsize_bytes / (1024 * 1024),
            "stats"
        );
    }
}

/// Resident and committed size in bytes, when the platform exposes them.
#[cfg(target_os = "linux")]
fn process_memory() -> Option<(u64, u64)> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let mut fields = statm.split_whitespace();
    let vsize_pages: u64 = fields.next()?.parse().ok()?;
    let rss_pages: u64 = fields.next()?.parse().ok()?;
    let page = 4096;
    Some((rss_pages * page, vsize_pages * page))
}

#[cfg(windows)]
fn process_memory() -> Option<(u64, u64)> {
    use windows_sys::Win32::System::ProcessStatus::{
        GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
    };
    use windows_sys::Win32::System::Threading::GetCurrentProcess;

    let mut counters = PROCESS_MEMORY_COUNTERS {
        cb: std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32,
        PageFaultCount: 0,
        PeakWorkingSetSize: 0,
        WorkingSetSize: 0,
        QuotaPeakPagedPoolUsage: 0,
        QuotaPagedPoolUsage: 0,
        QuotaPeakNonPagedPoolUsage: 0,
        QuotaNonPagedPoolUsage: 0,
        PagefileUsage: 0,
        PeakPagefileUsage: 0,
    };
    let ok = unsafe { GetProcessMemoryInfo(GetCurrentProcess(), &mut counters, counters.cb) };
    if ok == 0 {
        return None;
    }
    // Working set is the resident figure; pagefile usage is the private
    // commit, the closest counter to heap allocation.
    Some((counters.WorkingSetSize as u64, counters.PagefileUsage as u64))
}

#[cfg(not(any(target_os = "linux", windows)))]
fn process_memory() -> Option<(u64, u64)> {
    None
}
