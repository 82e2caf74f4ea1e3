use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voicetask_gateway::api::{ApiServer, ApiState};
use voicetask_gateway::providers::Providers;
use voicetask_gateway::Config;

/// Voicetask - voice-to-task assistant gateway
#[derive(Parser)]
#[command(name = "voicetask", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "VOICETASK_PORT")]
    port: Option<u16>,

    /// Path to a TOML config file (defaults to the user config dir)
    #[arg(short, long, env = "VOICETASK_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voicetask_gateway=info",
        1 => "info,voicetask_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref(), cli.port)?;
    tracing::debug!(?config, "configuration loaded");

    let providers = Providers::from_config(&config)?;
    tracing::info!(
        stt = providers.stt.name(),
        llm = providers.llm.name(),
        tts = providers.tts.name(),
        "providers configured"
    );

    let state = Arc::new(ApiState::new(&providers, &config));
    ApiServer::new(state, config.server.port).run().await?;

    Ok(())
}
