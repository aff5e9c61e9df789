// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence sinks: an embedded relational store and a remote capped
//! stream behind one contract. The variant is selected once at startup and
//! the two are never active simultaneously for this writer.

mod relational;
mod stream;

pub use relational::{EventCounts, RelationalSink};
pub use stream::{StreamSink, STREAM_MAX_LEN};

use crate::config::Config;
use crate::record::ActivityRecord;

pub enum Sink {
    Relational(RelationalSink),
    Stream(StreamSink),
}

impl Sink {
    /// Open the sink selected by the configuration: the remote stream when a
    /// redis address is configured, the embedded store otherwise. Failure
    /// here is fatal to startup.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        match config.stream_addr() {
            Some(addr) => {
                let sink = StreamSink::open(addr, &config.namespace).await?;
                Ok(Self::Stream(sink))
            }
            None => Ok(Self::Relational(RelationalSink::open(&config.db)?)),
        }
    }

    /// Move a drained batch into the sink, preserving admission order.
    ///
    /// Relational: one transaction, all-or-nothing; the error carries the
    /// whole batch loss. Stream: per-record best effort; the count of
    /// published records is returned.
    pub async fn drain(&mut self, records: Vec<ActivityRecord>) -> anyhow::Result<usize> {
        match self {
            Self::Relational(sink) => sink.drain(&records),
            Self::Stream(sink) => Ok(sink.drain(&records).await),
        }
    }

    /// Event-table counters for the stats snapshot; `None` for the stream
    /// sink, which has no queryable backlog.
    pub fn event_counts(&self) -> Option<EventCounts> {
        match self {
            Self::Relational(sink) => sink.event_counts().ok(),
            Self::Stream(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Relational(_) => "relational",
            Self::Stream(_) => "stream",
        }
    }

    /// Close the underlying connection. Called once, after the final drain.
    pub fn close(self) -> anyhow::Result<()> {
        match self {
            Self::Relational(sink) => sink.close(),
            Self::Stream(sink) => sink.close(),
        }
    }
}
