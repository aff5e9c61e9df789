// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level supervisor: init, task spawning, signal handling, and the
//! ordered shutdown sequence (stop ticker → final drain → close sink).

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::capture::ScreenCapture;
use crate::config::Config;
use crate::flush::Flusher;
use crate::probe::SystemProbe;
use crate::record;
use crate::ring::{FlushReason, RecordBuffer};
use crate::sampler::{Sampler, SamplerStats};
use crate::sink::Sink;
use crate::stats;

/// How the process came down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Final drain completed and the sink closed inside the deadline.
    Clean,
    /// The shutdown deadline elapsed first; buffered records may be lost.
    DrainTimeout,
}

/// A fully-initialized daemon with all tasks running.
///
/// Returned by [`prepare`] so callers (and tests) can reach the shutdown
/// token and shared state before entering [`Daemon::run`].
pub struct Daemon {
    pub shutdown: CancellationToken,
    pub buffer: Arc<RecordBuffer>,
    pub stats: Arc<SamplerStats>,
    config: Config,
    flusher: Flusher,
    sink: Arc<Mutex<Sink>>,
    sampler_handle: JoinHandle<anyhow::Result<()>>,
    listener_handle: JoinHandle<()>,
    stats_handle: JoinHandle<()>,
}

/// Initialize tracing/logging from config.
///
/// Uses `try_init` so it's safe to call multiple times (e.g. from tests).
/// All operational output goes to stderr.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    // Priority: --log-level / MNEMOSYNE_LOG_LEVEL > RUST_LOG > default ("info").
    let filter = if std::env::var("MNEMOSYNE_LOG_LEVEL").is_err() && config.log_level == "info" {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    } else {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let result = match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().try_init()
        }
        _ => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init(),
    };
    drop(result);
}

/// Run the daemon to completion.
pub async fn run(config: Config) -> anyhow::Result<Outcome> {
    prepare(config).await?.run().await
}

/// Bring the daemon up: open the sink, build the buffer, spawn the sampler,
/// flush-listener, stats, and signal tasks.
///
/// Init failures (notably: the sink cannot open) surface as `Err` and the
/// process exits non-zero before any sampling starts.
pub async fn prepare(config: Config) -> anyhow::Result<Daemon> {
    init_tracing(&config);
    let shutdown = CancellationToken::new();

    // init → running. Sink open is the fatal step.
    let sink = Sink::open(&config).await?;
    info!(sink = sink.kind(), "sink opened");
    let sink = Arc::new(Mutex::new(sink));

    let (buffer, flush_rx) =
        RecordBuffer::new(config.capacity(), config.high_water(), config.flush_period());
    let stats = Arc::new(SamplerStats::default());
    let flusher = Flusher::new(Arc::clone(&buffer), Arc::clone(&sink), Arc::clone(&stats));

    let session_id = record::new_session_id();
    info!(session_id, "session started");

    spawn_signal_task(shutdown.clone());

    let listener_handle = tokio::spawn(flusher.clone().run_listener(flush_rx, shutdown.clone()));
    let stats_handle = tokio::spawn(stats::run(
        Arc::clone(&stats),
        Arc::clone(&buffer),
        Arc::clone(&sink),
        config.stats_period(),
        shutdown.clone(),
    ));

    let sampler = Sampler::new(
        SystemProbe::default(),
        ScreenCapture::new(config.quality),
        Arc::clone(&buffer),
        flusher.clone(),
        Arc::clone(&stats),
        session_id,
        &config,
    );
    let sampler_handle = tokio::spawn(sampler.run(shutdown.clone()));

    Ok(Daemon {
        shutdown,
        buffer,
        stats,
        config,
        flusher,
        sink,
        sampler_handle,
        listener_handle,
        stats_handle,
    })
}

impl Daemon {
    /// Wait for a shutdown signal (or a sampler-loop return), then tear down
    /// in order: the ticker is fully stopped before the final drain, and the
    /// drain finishes before the sink closes. The whole stopping sequence is
    /// bounded by the shutdown deadline.
    pub async fn run(self) -> anyhow::Result<Outcome> {
        let Self {
            shutdown,
            buffer: _buffer,
            stats: _stats,
            config,
            flusher,
            sink,
            mut sampler_handle,
            listener_handle,
            stats_handle,
        } = self;

        // running: wait for cancellation or the sampler finishing on its own.
        let mut sampler_result: Option<anyhow::Result<()>> = None;
        tokio::select! {
            _ = shutdown.cancelled() => {}
            joined = &mut sampler_handle => {
                sampler_result = Some(flatten_join(joined));
            }
        }
        shutdown.cancel();
        info!("stopping");

        let deadline = config.shutdown_deadline();
        let teardown = async move {
            if sampler_result.is_none() {
                sampler_result = Some(flatten_join(sampler_handle.await));
            }
            let _ = listener_handle.await;
            let _ = stats_handle.await;

            flusher.flush(FlushReason::Shutdown).await;
            drop(flusher);

            match Arc::try_unwrap(sink) {
                Ok(sink) => sink.into_inner().close()?,
                Err(_) => error!("sink still shared at close; relying on drop"),
            }
            anyhow::Ok(sampler_result)
        };

        match tokio::time::timeout(deadline, teardown).await {
            Ok(result) => {
                if let Some(Err(err)) = result? {
                    return Err(err.context("sampler loop failed"));
                }
                info!("stopped");
                Ok(Outcome::Clean)
            }
            Err(_) => {
                error!(
                    deadline_secs = deadline.as_secs(),
                    "shutdown deadline exceeded before the final drain completed"
                );
                Ok(Outcome::DrainTimeout)
            }
        }
    }
}

fn flatten_join(joined: Result<anyhow::Result<()>, tokio::task::JoinError>) -> anyhow::Result<()> {
    match joined {
        Ok(result) => result,
        Err(err) => Err(anyhow::anyhow!("sampler task died: {err}")),
    }
}

/// First INT/TERM requests a graceful stop; a second forces exit.
fn spawn_signal_task(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("received shutdown signal");
        shutdown.cancel();

        wait_for_signal().await;
        info!("received second signal, forcing exit");
        std::process::exit(130);
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut sigterm =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

    tokio::select! {
        _ = async {
            if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
        } => {}
        _ = async {
            if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
        } => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
