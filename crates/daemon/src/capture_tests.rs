// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::probe::Rect;

use super::*;

#[test]
fn degenerate_rects_are_rejected_before_any_grab() {
    let mut capture = ScreenCapture::new(DEFAULT_QUALITY);
    for rect in [
        Rect::EMPTY,
        Rect { left: 100, top: 100, right: 100, bottom: 300 },
        Rect { left: 100, top: 100, right: 300, bottom: 100 },
        Rect { left: 300, top: 0, right: 100, bottom: 200 },
    ] {
        let err = capture.capture(rect).unwrap_err();
        assert!(err.to_string().contains("degenerate"), "unexpected error: {err}");
    }
}

#[test]
fn crop_clamps_to_monitor_bounds() {
    // Window hangs off the right edge of a 1920x1080 monitor at the origin.
    let rect = Rect { left: 1800, top: 50, right: 2100, bottom: 250 };
    assert_eq!(monitor_crop(&rect, 0, 0, 1920, 1080), Some((1800, 50, 120, 200)));
}

#[test]
fn crop_translates_to_monitor_local_coordinates() {
    // Secondary monitor positioned left of the primary.
    let rect = Rect { left: -1820, top: 100, right: -1420, bottom: 400 };
    assert_eq!(monitor_crop(&rect, -1920, 0, 1920, 1080), Some((100, 100, 400, 300)));
}

#[test]
fn crop_outside_the_monitor_is_none() {
    let rect = Rect { left: 4000, top: 0, right: 4400, bottom: 300 };
    assert_eq!(monitor_crop(&rect, 0, 0, 1920, 1080), None);
}
