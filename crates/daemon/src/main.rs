// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use mnemosyne::config::Config;
use mnemosyne::run::{self, Outcome};

#[derive(Parser)]
#[command(name = "mnemosyne", version, about = "Foreground-activity sampler daemon.")]
struct Cli {
    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.config;

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    match run::run(config).await {
        Ok(Outcome::Clean) => std::process::exit(0),
        Ok(Outcome::DrainTimeout) => std::process::exit(1),
        Err(e) => {
            error!("fatal: {e:#}");
            std::process::exit(1);
        }
    }
}
