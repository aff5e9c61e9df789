// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote stream sink: appends each record to a capped redis stream.
//!
//! Delivery is best-effort: a failed publish is logged and the rest of the
//! batch still goes out. No order loss, possible record loss, no duplicates.

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use redis::aio::ConnectionManager;
use tracing::{info, warn};

use crate::record::ActivityRecord;
use crate::sparse::SparseCounter;

/// Approximate cap on the stream; the server trims older entries.
pub const STREAM_MAX_LEN: usize = 5000;

/// Reachability check deadline at startup.
const PING_DEADLINE: std::time::Duration = std::time::Duration::from_secs(2);

/// How often repeated publish failures are logged.
const PUBLISH_LOG_EVERY: u64 = 50;

pub struct StreamSink {
    conn: ConnectionManager,
    stream_key: String,
    publish_failures: SparseCounter,
}

impl StreamSink {
    /// Connect and verify reachability with a short-deadline ping.
    pub async fn open(addr: &str, namespace: &str) -> anyhow::Result<Self> {
        let url = connection_url(addr);
        let client = redis::Client::open(url.as_str())
            .with_context(|| format!("invalid redis address {addr}"))?;
        let mut conn = ConnectionManager::new(client)
            .await
            .with_context(|| format!("connect to redis at {addr}"))?;

        tokio::time::timeout(
            PING_DEADLINE,
            redis::cmd("PING").query_async::<_, String>(&mut conn),
        )
        .await
        .context("redis ping timed out")?
        .context("redis ping failed")?;

        let stream_key = stream_key(namespace);
        info!(addr, stream = %stream_key, "stream sink opened");
        Ok(Self { conn, stream_key, publish_failures: SparseCounter::new(PUBLISH_LOG_EVERY) })
    }

    /// Publish each record individually with the approximate length cap.
    /// Returns how many records went out.
    pub async fn drain(&mut self, records: &[ActivityRecord]) -> usize {
        let mut published = 0;
        for record in records {
            let cmd = build_xadd(&self.stream_key, &stream_fields(record));
            match cmd.query_async::<_, String>(&mut self.conn).await {
                Ok(_id) => published += 1,
                Err(err) => {
                    if self.publish_failures.should_log() {
                        warn!(
                            stream = %self.stream_key,
                            occurrences = self.publish_failures.count(),
                            "publish failed: {err}"
                        );
                    }
                }
            }
        }
        published
    }

    pub fn close(self) -> anyhow::Result<()> {
        // The multiplexed connection shuts down when the manager drops.
        Ok(())
    }
}

/// `host:port` is accepted bare; full redis URLs pass through.
fn connection_url(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_owned()
    } else {
        format!("redis://{addr}")
    }
}

fn stream_key(namespace: &str) -> String {
    format!("{namespace}:events")
}

/// One capped append: `XADD <key> MAXLEN ~ 5000 * <field> <value> ...`.
/// The `~` makes the cap approximate so the server can trim lazily.
fn build_xadd(stream_key: &str, fields: &[(&'static str, String)]) -> redis::Cmd {
    let mut cmd = redis::cmd("XADD");
    cmd.arg(stream_key).arg("MAXLEN").arg("~").arg(STREAM_MAX_LEN).arg("*");
    for (key, value) in fields {
        cmd.arg(*key).arg(value);
    }
    cmd
}

/// Flatten a record into the stream's key/value fields. `image_data` is
/// present only when a screenshot rode along, base64-encoded.
fn stream_fields(record: &ActivityRecord) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("session_uuid", record.session_id.clone()),
        ("unix_time", record.unix_time().to_string()),
        ("process_name", record.process_name.clone()),
        ("window_title", record.window_title.clone()),
        ("window_hwnd", record.window_handle.to_string()),
        ("input_idle", record.idle_ms.to_string()),
        ("intensity", record.input_intensity.to_string()),
        ("screenshot_path", record.screenshot_marker.unwrap_or("").to_owned()),
    ];
    if let Some(bytes) = &record.screenshot_bytes {
        fields.push(("image_data", BASE64.encode(bytes)));
    }
    fields
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
