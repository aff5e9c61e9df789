// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `mnemosyne` binary as a subprocess and exercises the
//! lifecycle: startup, sink creation, signal-driven shutdown, exit codes.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Resolve the path to the compiled `mnemosyne` binary.
pub fn daemon_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("mnemosyne")
}

/// A running `mnemosyne` process that is killed on drop.
pub struct DaemonProcess {
    child: Child,
    db_path: PathBuf,
    _data_dir: tempfile::TempDir,
}

impl DaemonProcess {
    /// Spawn the daemon with a temp database and fast timings, plus any
    /// extra flags.
    pub fn start(extra_args: &[&str]) -> anyhow::Result<Self> {
        let binary = daemon_binary();
        anyhow::ensure!(binary.exists(), "mnemosyne binary not found at {}", binary.display());

        let data_dir = tempfile::tempdir()?;
        let db_path = data_dir.path().join("activity.db");

        let mut args: Vec<String> = vec![
            "--db".into(),
            db_path.to_string_lossy().into_owned(),
            "--tick".into(),
            "100".into(),
            "--flush".into(),
            "1".into(),
            "--shutdown".into(),
            "5".into(),
            "--log-level".into(),
            "warn".into(),
        ];
        args.extend(extra_args.iter().map(|s| (*s).to_owned()));

        let child = Command::new(&binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, db_path, _data_dir: data_dir })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Ask the daemon to stop the way an init system would.
    #[cfg(unix)]
    pub fn terminate(&self) -> anyhow::Result<()> {
        let status = Command::new("kill")
            .args(["-TERM", &self.pid().to_string()])
            .status()?;
        anyhow::ensure!(status.success(), "kill -TERM failed");
        Ok(())
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(
        &mut self,
        timeout: Duration,
    ) -> anyhow::Result<std::process::ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("mnemosyne did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
