// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use chrono::Utc;

use super::*;

fn record(title: &str) -> ActivityRecord {
    ActivityRecord::new(
        "session".to_owned(),
        Utc::now(),
        "PID_7".to_owned(),
        title.to_owned(),
        1,
        0,
        0.0,
        None,
    )
}

const PERIOD: Duration = Duration::from_secs(300);

#[tokio::test]
async fn high_water_fires_exactly_at_the_mark() {
    let (buffer, _rx) = RecordBuffer::new(6, 3, PERIOD);

    assert!(!buffer.add(record("a")));
    assert!(!buffer.add(record("b")));
    assert!(buffer.add(record("c")));
    // Above the mark it keeps suggesting until someone drains.
    assert!(buffer.add(record("d")));
    assert_eq!(buffer.len(), 4);
}

#[tokio::test]
async fn drain_empties_in_admission_order() {
    let (buffer, _rx) = RecordBuffer::new(8, 4, PERIOD);
    for title in ["one", "two", "three"] {
        buffer.add(record(title));
    }

    let drained = buffer.drain();
    let titles: Vec<&str> = drained.iter().map(|r| r.window_title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
    assert_eq!(buffer.len(), 0);
    assert!(buffer.is_empty());
    assert_eq!(buffer.approx_bytes(), 0);
}

#[tokio::test]
async fn approx_bytes_tracks_contents() {
    let (buffer, _rx) = RecordBuffer::new(8, 8, PERIOD);
    buffer.add(record("abcdef"));
    let one = buffer.approx_bytes();
    buffer.add(record("abcdef"));
    assert_eq!(buffer.approx_bytes(), 2 * one);
}

#[tokio::test]
async fn full_buffer_evicts_oldest() {
    let (buffer, _rx) = RecordBuffer::new(2, 2, PERIOD);
    buffer.add(record("old"));
    buffer.add(record("mid"));
    buffer.add(record("new"));

    assert_eq!(buffer.dropped(), 1);
    let titles: Vec<String> = buffer.drain().into_iter().map(|r| r.window_title).collect();
    assert_eq!(titles, vec!["mid", "new"]);
}

#[tokio::test(start_paused = true)]
async fn timer_fires_into_the_flush_channel() {
    let (buffer, mut rx) = RecordBuffer::new(8, 8, Duration::from_secs(10));
    buffer.add(record("pending"));

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(rx.try_recv().ok(), Some(FlushReason::Timer));
}

#[tokio::test(start_paused = true)]
async fn timer_is_quiet_while_empty() {
    let (_buffer, mut rx) = RecordBuffer::new(8, 8, Duration::from_secs(10));

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn timer_notifications_coalesce() {
    let (buffer, mut rx) = RecordBuffer::new(8, 8, Duration::from_secs(10));
    buffer.add(record("pending"));

    // Two periods elapse with nobody consuming; only one slot is held.
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(rx.try_recv().ok(), Some(FlushReason::Timer));
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn drain_restarts_the_timer_wait() {
    let (buffer, mut rx) = RecordBuffer::new(8, 8, Duration::from_secs(10));
    buffer.add(record("pending"));

    tokio::time::sleep(Duration::from_secs(6)).await;
    buffer.drain();
    buffer.add(record("later"));

    // Only 6s remain on the old schedule; the reset pushes the next fire
    // a full period out from the drain.
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(rx.try_recv().is_err());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(rx.try_recv().ok(), Some(FlushReason::Timer));
}

#[tokio::test(start_paused = true)]
async fn drain_final_stops_the_timer() {
    let (buffer, mut rx) = RecordBuffer::new(8, 8, Duration::from_secs(10));
    buffer.add(record("pending"));

    let drained = buffer.drain_final();
    assert_eq!(drained.len(), 1);

    buffer.add(record("straggler"));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(rx.try_recv().is_err());
}
