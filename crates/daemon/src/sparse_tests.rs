// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn first_occurrence_always_logs() {
    let mut counter = SparseCounter::new(50);
    assert!(counter.should_log());
}

#[test]
fn every_nth_after_the_first() {
    let mut counter = SparseCounter::new(3);
    let admitted: Vec<bool> = (0..7).map(|_| counter.should_log()).collect();
    assert_eq!(admitted, vec![true, false, false, true, false, false, true]);
    assert_eq!(counter.count(), 7);
}

#[test]
fn zero_period_is_clamped() {
    let mut counter = SparseCounter::new(0);
    assert!(counter.should_log());
    assert!(counter.should_log());
}
