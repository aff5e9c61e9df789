// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory screenshot capture: grab the monitor under the window rect,
//! crop, and JPEG-encode at a configured quality. Never touches disk.

use std::io::Cursor;

use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use xcap::Monitor;

use crate::probe::Rect;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 75;

/// Screen-grab seam. The production implementation talks to the compositor;
/// tests substitute a scripted one.
pub trait Capture: Send {
    /// Grab the given rectangle and return it as an in-memory JPEG.
    /// Degenerate rectangles are rejected before any platform call.
    fn capture(&mut self, rect: Rect) -> anyhow::Result<Vec<u8>>;
}

pub struct ScreenCapture {
    quality: u8,
}

impl ScreenCapture {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl Capture for ScreenCapture {
    fn capture(&mut self, rect: Rect) -> anyhow::Result<Vec<u8>> {
        anyhow::ensure!(
            !rect.is_degenerate(),
            "degenerate capture rect {}x{}",
            rect.width(),
            rect.height()
        );

        let monitors = Monitor::all().context("enumerate monitors")?;
        let monitor = monitors
            .iter()
            .find(|m| contains_origin(m, &rect))
            .or_else(|| monitors.iter().find(|m| m.is_primary()))
            .or_else(|| monitors.first())
            .ok_or_else(|| anyhow::anyhow!("no monitor available"))?;

        let frame = monitor.capture_image().context("grab monitor frame")?;
        let (x, y, w, h) = monitor_crop(
            &rect,
            monitor.x(),
            monitor.y(),
            monitor.width(),
            monitor.height(),
        )
        .ok_or_else(|| anyhow::anyhow!("window rect lies outside the captured monitor"))?;

        let cropped = image::imageops::crop_imm(&frame, x, y, w, h).to_image();
        // JPEG has no alpha channel; flatten before encoding.
        let rgb = DynamicImage::ImageRgba8(cropped).to_rgb8();

        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, self.quality);
        rgb.write_with_encoder(encoder).context("encode jpeg")?;
        Ok(out)
    }
}

fn contains_origin(monitor: &Monitor, rect: &Rect) -> bool {
    let mx = monitor.x();
    let my = monitor.y();
    rect.left >= mx
        && rect.left < mx + monitor.width() as i32
        && rect.top >= my
        && rect.top < my + monitor.height() as i32
}

/// Intersect a virtual-screen rect with a monitor's bounds and translate it
/// into monitor-local pixel coordinates. `None` when the intersection is
/// empty.
fn monitor_crop(rect: &Rect, mx: i32, my: i32, mw: u32, mh: u32) -> Option<(u32, u32, u32, u32)> {
    let left = rect.left.max(mx);
    let top = rect.top.max(my);
    let right = rect.right.min(mx + mw as i32);
    let bottom = rect.bottom.min(my + mh as i32);
    if right <= left || bottom <= top {
        return None;
    }
    Some((
        (left - mx) as u32,
        (top - my) as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
