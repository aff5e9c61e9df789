// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only observation of the host windowing and input state.
//!
//! Every operation is individually non-fatal: failures collapse to a sentinel
//! or default so a broken syscall degrades one tick instead of killing the
//! loop. Failure logging is rate-limited per error class.

#[cfg(windows)]
mod win;
#[cfg(windows)]
pub use win::WinProbe;

#[cfg(not(windows))]
mod unsupported;
#[cfg(not(windows))]
pub use unsupported::UnsupportedProbe;

/// The probe implementation for the build target.
#[cfg(windows)]
pub type SystemProbe = WinProbe;
#[cfg(not(windows))]
pub type SystemProbe = UnsupportedProbe;

/// Placeholder title returned when the title query fails.
pub const FALLBACK_TITLE: &str = "<unknown>";

/// Upper bound on a stored window title, in bytes, after truncation.
pub const TITLE_MAX_BYTES: usize = 2048;

/// Window rectangle in virtual-screen coordinates. May have non-positive
/// dimensions; callers must check before using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const EMPTY: Rect = Rect { left: 0, top: 0, right: 0, bottom: 0 };

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True when the rect cannot produce a capture.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

/// Syscall-level queries against the host windowing system.
///
/// `&mut self` throughout: implementations reuse pooled backing storage and
/// keep per-class failure counters.
pub trait Probe: Send {
    /// The focused window, or `None` when there is none (e.g. the
    /// workstation is locked). A `None` result skips the tick's recording.
    fn foreground_window(&mut self) -> Option<u64>;

    /// Title of the given window. Returns [`FALLBACK_TITLE`] on failure and
    /// never errors into the loop. Bounded by [`TITLE_MAX_BYTES`].
    fn window_title(&mut self, handle: u64) -> String;

    /// Owning thread and process ids. Failure collapses to `process_id = 0`.
    fn thread_and_process_id(&mut self, handle: u64) -> (u32, u32);

    /// Window rectangle; degenerate on failure.
    fn window_rect(&mut self, handle: u64) -> Rect;

    /// Tick value of the last input event. Wraps roughly every 49.7 days;
    /// combine with [`Probe::system_tick`] via [`idle_millis`].
    fn last_input_tick(&mut self) -> u32;

    /// Current system tick, same clock as [`Probe::last_input_tick`].
    fn system_tick(&mut self) -> u32;

    /// True iff the OS reports a Direct3D full-screen application running.
    fn is_full_screen_game(&mut self) -> bool;
}

/// Milliseconds since the last input event, wrap-safe across the 32-bit
/// tick counter rollover. Always non-negative and strictly below 2³².
pub fn idle_millis(system_tick: u32, last_input_tick: u32) -> u64 {
    u64::from(system_tick.wrapping_sub(last_input_tick))
}

/// Truncate a title to [`TITLE_MAX_BYTES`] on a char boundary.
pub fn bound_title(mut title: String) -> String {
    if title.len() <= TITLE_MAX_BYTES {
        return title;
    }
    let mut cut = TITLE_MAX_BYTES;
    while !title.is_char_boundary(cut) {
        cut -= 1;
    }
    title.truncate(cut);
    title
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
