// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Utc};

use super::*;

fn record_with(intensity: f64, screenshot: Option<Vec<u8>>) -> ActivityRecord {
    let wall = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().unwrap_or_default();
    ActivityRecord::new(
        "session-1".to_owned(),
        wall,
        "PID_4242".to_owned(),
        "editor — main.rs".to_owned(),
        0xBEEF,
        250,
        intensity,
        screenshot,
    )
}

#[test]
fn marker_tracks_screenshot_presence() {
    let with = record_with(0.5, Some(vec![0xFF, 0xD8]));
    assert_eq!(with.screenshot_marker, Some(SCREENSHOT_IN_MEMORY));

    let without = record_with(0.5, None);
    assert_eq!(without.screenshot_marker, None);
}

#[test]
fn intensity_is_clamped() {
    assert_eq!(record_with(1.7, None).input_intensity, 1.0);
    assert_eq!(record_with(-0.2, None).input_intensity, 0.0);
    assert_eq!(record_with(0.42, None).input_intensity, 0.42);
}

#[test]
fn timestamp_rendering() {
    let record = record_with(0.0, None);
    assert_eq!(record.timestamp_utc(), "2026-03-14T09:26:53.000Z");
    assert_eq!(record.unix_time(), record.wall_time.timestamp());
}

#[test]
fn approx_size_counts_strings_and_payload() {
    let bare = record_with(0.0, None);
    let with_shot = record_with(0.0, Some(vec![0u8; 1000]));
    assert_eq!(with_shot.approx_size(), bare.approx_size() + 1000);
    assert!(bare.approx_size() > bare.window_title.len());
}

#[test]
fn session_ids_are_unique_and_non_empty() {
    let a = new_session_id();
    let b = new_session_id();
    assert!(!a.is_empty());
    assert_ne!(a, b);
}
