//! User-agent blocking gate.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                  UA-BLOCKER                  │
//!                      │                                              │
//!   Client Request     │  ┌─────────┐  ┌────────────┐  ┌──────────┐  │
//!   ───────────────────┼─▶│  http   │─▶│   filter   │─▶│  proxy   │──┼──▶ Upstream
//!                      │  │ server  │  │ (UA check) │  │ handler  │  │
//!                      │  └─────────┘  └─────┬──────┘  └──────────┘  │
//!   403 Forbidden      │                     │                        │
//!   ◀──────────────────┼─────────────────────┘                        │
//!                      │                                              │
//!                      │  ┌────────┐ ┌─────────┐ ┌───────────────┐   │
//!                      │  │ config │ │  agent  │ │ observability │   │
//!                      │  │ +watch │ │resolver │ │ logs/metrics  │   │
//!                      │  └────────┘ └─────────┘ └───────────────┘   │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use ua_blocker::lifecycle::startup::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "ua-blocker")]
#[command(about = "Reverse-proxy gate that rejects denylisted user agents", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "ua-blocker.toml")]
    config: PathBuf,

    /// Reload the denylist when the configuration file changes.
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    startup::run(StartupOptions {
        config_path: cli.config,
        watch: cli.watch,
    })
    .await
}
