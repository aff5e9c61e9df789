// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Foreground-activity sampler daemon.
#[derive(Debug, Parser)]
#[command(name = "mnemosyne", version, about)]
pub struct Config {
    /// Embedded sink database file.
    #[arg(long, env = "MNEMOSYNE_DB", default_value = ".mnemosyne/activity.db")]
    pub db: PathBuf,

    /// Redis host:port. When set, events go to the remote stream instead of
    /// the embedded database.
    #[arg(long, env = "MNEMOSYNE_REDIS")]
    pub redis: Option<String>,

    /// Stream namespace for the remote sink (stream is `<namespace>:events`).
    #[arg(long, env = "MNEMOSYNE_NAMESPACE", default_value = "mnemosyne")]
    pub namespace: String,

    /// Sampling period in milliseconds.
    #[arg(long, env = "MNEMOSYNE_TICK_MS", default_value = "1000")]
    pub tick: u64,

    /// Idle threshold in seconds.
    #[arg(long, env = "MNEMOSYNE_IDLE_SECS", default_value = "60")]
    pub idle: u64,

    /// Ring buffer high-water mark (records per flush batch).
    #[arg(long, env = "MNEMOSYNE_BUFFER", default_value = "100")]
    pub buffer: usize,

    /// Auto-flush period in seconds.
    #[arg(long, env = "MNEMOSYNE_FLUSH_SECS", default_value = "300")]
    pub flush: u64,

    /// Minimum interval between screenshots in milliseconds.
    #[arg(long, env = "MNEMOSYNE_SCREENSHOT_MS", default_value = "1000")]
    pub screenshot: u64,

    /// JPEG quality for captured screenshots (1-100).
    #[arg(long, env = "MNEMOSYNE_QUALITY", default_value = "75")]
    pub quality: u8,

    /// Stats snapshot period in seconds.
    #[arg(long, env = "MNEMOSYNE_STATS_SECS", default_value = "30")]
    pub stats: u64,

    /// Shutdown deadline in seconds for the final drain.
    #[arg(long, env = "MNEMOSYNE_SHUTDOWN_SECS", default_value = "30")]
    pub shutdown: u64,

    /// Log format (json or text).
    #[arg(long, env = "MNEMOSYNE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "MNEMOSYNE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tick == 0 {
            anyhow::bail!("--tick must be positive");
        }
        if self.buffer == 0 {
            anyhow::bail!("--buffer must be positive");
        }
        if self.flush == 0 {
            anyhow::bail!("--flush must be positive");
        }
        if self.screenshot == 0 {
            anyhow::bail!("--screenshot must be positive");
        }
        if self.shutdown == 0 {
            anyhow::bail!("--shutdown must be positive");
        }
        if !(1..=100).contains(&self.quality) {
            anyhow::bail!("--quality must be in 1..=100");
        }
        if self.namespace.is_empty() {
            anyhow::bail!("--namespace must not be empty");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// The remote stream address, or `None` when unset or empty (empty means
    /// the embedded sink stays selected).
    pub fn stream_addr(&self) -> Option<&str> {
        self.redis.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick)
    }

    pub fn idle_threshold_ms(&self) -> u64 {
        self.idle.saturating_mul(1000)
    }

    pub fn flush_period(&self) -> Duration {
        Duration::from_secs(self.flush)
    }

    pub fn screenshot_interval(&self) -> Duration {
        Duration::from_millis(self.screenshot)
    }

    pub fn stats_period(&self) -> Duration {
        Duration::from_secs(self.stats)
    }

    pub fn shutdown_deadline(&self) -> Duration {
        Duration::from_secs(self.shutdown)
    }

    /// High-water mark H: drain as soon as this many records are buffered.
    pub fn high_water(&self) -> usize {
        self.buffer
    }

    /// Buffer capacity K, sized so a stalled sink has headroom before
    /// eviction starts.
    pub fn capacity(&self) -> usize {
        self.buffer.saturating_mul(2)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
