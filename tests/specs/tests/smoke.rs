// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `mnemosyne` binary.

use std::time::Duration;

use mnemosyne_specs::DaemonProcess;

const TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(unix)]
#[tokio::test]
async fn term_signal_shuts_down_with_exit_zero() -> anyhow::Result<()> {
    let mut daemon = DaemonProcess::start(&[])?;

    // Give it a few ticks before asking it to stop.
    tokio::time::sleep(Duration::from_millis(500)).await;
    daemon.terminate()?;

    let status = daemon.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(0));

    // The embedded store exists and carries the event schema, drained on
    // the way out.
    let conn = rusqlite::Connection::open(daemon.db_path())?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    assert!(total >= 0);
    Ok(())
}

#[tokio::test]
async fn invalid_flags_exit_with_usage_error() -> anyhow::Result<()> {
    let binary = mnemosyne_specs::daemon_binary();
    anyhow::ensure!(binary.exists(), "mnemosyne binary not found");

    let status = std::process::Command::new(&binary)
        .args(["--tick", "0"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}

#[tokio::test]
async fn unreachable_redis_fails_startup() -> anyhow::Result<()> {
    let mut daemon = DaemonProcess::start(&["--redis", "127.0.0.1:1"])?;

    let status = daemon.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(1));
    Ok(())
}
