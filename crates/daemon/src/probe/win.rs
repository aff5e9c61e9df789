// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Win32 probe: GetForegroundWindow, GetWindowTextW, GetLastInputInfo,
//! SHQueryUserNotificationState.

use tracing::warn;
use windows_sys::Win32::Foundation::RECT;
use windows_sys::Win32::System::SystemInformation::GetTickCount;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};
use windows_sys::Win32::UI::Shell::{SHQueryUserNotificationState, QUNS_RUNNING_D3D_FULL_SCREEN};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowRect, GetWindowTextW, GetWindowThreadProcessId,
};

use crate::sparse::SparseCounter;

use super::{bound_title, Probe, Rect, FALLBACK_TITLE};

/// Pooled UTF-16 title buffer length, in wide chars. Large enough that the
/// UTF-8 transcode always exceeds the 2 KiB truncation bound before the
/// buffer does.
const TITLE_BUF_LEN: usize = 1024;

/// How often repeated probe failures are logged.
const PROBE_LOG_EVERY: u64 = 50;

pub struct WinProbe {
    title_buf: Vec<u16>,
    /// Last successfully read input tick, reused when the query fails.
    cached_input_tick: u32,
    title_failures: SparseCounter,
    input_failures: SparseCounter,
    notify_failures: SparseCounter,
}

impl WinProbe {
    pub fn new() -> Self {
        Self {
            title_buf: vec![0u16; TITLE_BUF_LEN],
            cached_input_tick: 0,
            title_failures: SparseCounter::new(PROBE_LOG_EVERY),
            input_failures: SparseCounter::new(PROBE_LOG_EVERY),
            notify_failures: SparseCounter::new(PROBE_LOG_EVERY),
        }
    }
}

impl Default for WinProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for WinProbe {
    fn foreground_window(&mut self) -> Option<u64> {
        let hwnd = unsafe { GetForegroundWindow() };
        (hwnd != 0).then_some(hwnd as u64)
    }

    fn window_title(&mut self, handle: u64) -> String {
        let len = unsafe {
            GetWindowTextW(
                handle as isize,
                self.title_buf.as_mut_ptr(),
                self.title_buf.len() as i32,
            )
        };
        if len <= 0 {
            // Zero also means "no title"; treat both the same way.
            if self.title_failures.should_log() {
                warn!(handle, occurrences = self.title_failures.count(), "window title query failed");
            }
            return FALLBACK_TITLE.to_owned();
        }
        bound_title(String::from_utf16_lossy(&self.title_buf[..len as usize]))
    }

    fn thread_and_process_id(&mut self, handle: u64) -> (u32, u32) {
        let mut pid: u32 = 0;
        let tid = unsafe { GetWindowThreadProcessId(handle as isize, &mut pid) };
        (tid, pid)
    }

    fn window_rect(&mut self, handle: u64) -> Rect {
        let mut rect = RECT { left: 0, top: 0, right: 0, bottom: 0 };
        let ok = unsafe { GetWindowRect(handle as isize, &mut rect) };
        if ok == 0 {
            return Rect::EMPTY;
        }
        Rect { left: rect.left, top: rect.top, right: rect.right, bottom: rect.bottom }
    }

    fn last_input_tick(&mut self) -> u32 {
        let mut info = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };
        let ok = unsafe { GetLastInputInfo(&mut info) };
        if ok == 0 {
            if self.input_failures.should_log() {
                warn!(occurrences = self.input_failures.count(), "GetLastInputInfo failed");
            }
            return self.cached_input_tick;
        }
        self.cached_input_tick = info.dwTime;
        info.dwTime
    }

    fn system_tick(&mut self) -> u32 {
        unsafe { GetTickCount() }
    }

    fn is_full_screen_game(&mut self) -> bool {
        let mut state = 0;
        let hr = unsafe { SHQueryUserNotificationState(&mut state) };
        if hr != 0 {
            if self.notify_failures.should_log() {
                warn!(hr, occurrences = self.notify_failures.count(), "notification state query failed");
            }
            return false;
        }
        state == QUNS_RUNNING_D3D_FULL_SCREEN
    }
}
