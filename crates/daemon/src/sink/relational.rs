// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedded relational sink: transactional batch inserts into a single
//! SQLite file over one writer connection.
//!
//! Journal mode is picked from where the database lives: WAL on local
//! storage, rollback journal on network mounts where WAL's shared-memory
//! file misbehaves. Downstream readers open their own connections from a
//! separate process.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::{params, Connection};
use tracing::info;

use crate::record::ActivityRecord;

/// DDL artifact applied only when the database file is created.
const SCHEMA: &str = include_str!("../../schema/events.sql");

/// Column order here is authoritative; binds below follow it exactly.
const INSERT_EVENT: &str = "\
    INSERT INTO events (\
        session_uuid, timestamp_utc, unix_time, process_name, window_title, \
        window_hwnd, input_idle_ms, input_intensity, screenshot_path\
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const MMAP_SIZE_BYTES: i64 = 256 * 1024 * 1024;
const BUSY_TIMEOUT_MS: i64 = 5000;

/// Totals reported in the stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCounts {
    pub total: u64,
    pub pending: u64,
}

pub struct RelationalSink {
    conn: Connection,
    path: PathBuf,
}

impl RelationalSink {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create data directory {}", parent.display()))?;
            }
        }
        let fresh = !path.exists();

        let conn = Connection::open(path)
            .with_context(|| format!("open database {}", path.display()))?;

        let journal = journal_mode_for(path);
        conn.pragma_update(None, "journal_mode", journal)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "mmap_size", MMAP_SIZE_BYTES)?;
        conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        if fresh {
            conn.execute_batch(SCHEMA).context("apply event schema")?;
        }
        info!(path = %path.display(), journal, fresh, "relational sink opened");

        Ok(Self { conn, path: path.to_owned() })
    }

    /// Insert a batch inside one transaction. Any failure rolls the whole
    /// batch back and surfaces the error; the caller has already taken the
    /// records out of the buffer, so a failed batch is lost.
    ///
    /// Screenshot bytes are never written here; only the in-memory sentinel
    /// goes into `screenshot_path`.
    pub fn drain(&mut self, records: &[ActivityRecord]) -> anyhow::Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_EVENT)?;
            for record in records {
                stmt.execute(params![
                    record.session_id,
                    record.timestamp_utc(),
                    record.unix_time(),
                    record.process_name,
                    record.window_title,
                    record.window_handle as i64,
                    record.idle_ms as i64,
                    record.input_intensity,
                    record.screenshot_marker,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn event_counts(&self) -> anyhow::Result<EventCounts> {
        let total: i64 =
            self.conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        let pending: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE is_processed = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(EventCounts { total: total as u64, pending: pending as u64 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(self) -> anyhow::Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

/// WAL on local storage, rollback journal when the path sits on a network
/// filesystem.
fn journal_mode_for(path: &Path) -> &'static str {
    if on_network_mount(path) {
        "DELETE"
    } else {
        "WAL"
    }
}

#[cfg(target_os = "linux")]
fn on_network_mount(path: &Path) -> bool {
    let Ok(mounts) = std::fs::read_to_string("/proc/mounts") else {
        return false;
    };
    mount_fstype(path, &mounts).is_some_and(is_network_fs)
}

#[cfg(windows)]
fn on_network_mount(path: &Path) -> bool {
    // UNC paths (\\server\share\...) are the network case we can see
    // without touching the volume.
    let s = path.as_os_str().to_string_lossy();
    s.starts_with("\\\\") || s.starts_with("//")
}

#[cfg(not(any(target_os = "linux", windows)))]
fn on_network_mount(_path: &Path) -> bool {
    false
}

/// Filesystem type of the longest mount point prefixing `path`, from a
/// `/proc/mounts`-formatted table.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn mount_fstype<'a>(path: &Path, mounts: &'a str) -> Option<&'a str> {
    let target = path.to_string_lossy();
    let mut best: Option<(&str, &str)> = None;
    for line in mounts.lines() {
        let mut fields = line.split_whitespace();
        let (Some(_dev), Some(point), Some(fstype)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let covers = target == point
            || target.starts_with(&format!("{}/", point.trim_end_matches('/')))
            || point == "/";
        if covers && best.is_none_or(|(p, _)| point.len() > p.len()) {
            best = Some((point, fstype));
        }
    }
    best.map(|(_, fstype)| fstype)
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn is_network_fs(fstype: &str) -> bool {
    matches!(
        fstype,
        "nfs" | "nfs4" | "cifs" | "smb3" | "smbfs" | "sshfs" | "fuse.sshfs" | "9p" | "afs"
    )
}

#[cfg(test)]
#[path = "relational_tests.rs"]
mod tests;
