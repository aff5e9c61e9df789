// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fallback probe for targets without a supported windowing interface.
//!
//! Reports no foreground window, so every tick skips recording. The daemon
//! still starts, drains its timers, and shuts down cleanly, which keeps the
//! non-windows build useful for sink and lifecycle work.

use tracing::warn;

use super::{Probe, Rect, FALLBACK_TITLE};

pub struct UnsupportedProbe;

impl UnsupportedProbe {
    pub fn new() -> Self {
        warn!(os = std::env::consts::OS, "no platform probe for this target; sampling is inert");
        Self
    }
}

impl Default for UnsupportedProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for UnsupportedProbe {
    fn foreground_window(&mut self) -> Option<u64> {
        None
    }

    fn window_title(&mut self, _handle: u64) -> String {
        FALLBACK_TITLE.to_owned()
    }

    fn thread_and_process_id(&mut self, _handle: u64) -> (u32, u32) {
        (0, 0)
    }

    fn window_rect(&mut self, _handle: u64) -> Rect {
        Rect::EMPTY
    }

    fn last_input_tick(&mut self) -> u32 {
        0
    }

    fn system_tick(&mut self) -> u32 {
        0
    }

    fn is_full_screen_game(&mut self) -> bool {
        false
    }
}
