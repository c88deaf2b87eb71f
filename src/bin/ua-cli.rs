use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use ua_blocker::config::load_config;
use ua_blocker::{AgentResolver, ResolvedAgent, SignatureResolver, UserAgentBlockLayer};

#[derive(Parser)]
#[command(name = "ua-cli")]
#[command(about = "Inspect how user agents are resolved and filtered", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a User-Agent header to its canonical agent
    Resolve {
        /// Raw User-Agent header value
        user_agent: String,
    },
    /// Check whether a configuration would block a User-Agent
    Check {
        #[arg(short, long, default_value = "ua-blocker.toml")]
        config: PathBuf,

        /// Raw User-Agent header value
        user_agent: String,
    },
}

#[derive(Serialize)]
struct CheckReport {
    filter: String,
    denylist: Vec<String>,
    agent: ResolvedAgent,
    blocked: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { user_agent } => {
            print_json(&SignatureResolver.resolve(&user_agent))?;
        }
        Commands::Check { config, user_agent } => {
            let config = load_config(&config)?;
            let layer = UserAgentBlockLayer::new(config.filter.as_ref(), config.name.clone())?;
            let decision = layer.decide(&user_agent);

            let mut denylist: Vec<String> = layer.handle().load().iter().map(str::to_string).collect();
            denylist.sort_unstable();

            print_json(&CheckReport {
                filter: layer.name().to_string(),
                denylist,
                blocked: decision.is_reject(),
                agent: decision.agent().clone(),
            })?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
