use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use sawt_providers::ProviderStageFactory;
use sawt_server::ServerConfig;
use sawt_settings::SawtSettings;
use sawt_telemetry::{LogFormat, TelemetryConfig};

/// Realtime voice-chat bridge: audio in, transcript and spoken reply out.
#[derive(Debug, Parser)]
#[command(name = "sawt", version)]
struct Args {
    /// Settings file (defaults to ~/.sawt/settings.json).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bind address, overriding settings and SAWT_HOST.
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overriding settings and SAWT_PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = load_settings(&args)?;
    init_logging(&settings)?;

    tracing::info!(
        transcription_model = %settings.transcription.model,
        agent_model = %settings.agent.model,
        voice = %settings.speech.voice_name,
        "starting Sawt backend"
    );

    let factory = ProviderStageFactory::from_settings(&settings)
        .context("failed to build provider clients")?;
    let config = ServerConfig::from(&settings.server);
    let handle = sawt_server::start(config, Arc::new(factory))
        .await
        .context("failed to start server")?;

    tracing::info!(port = handle.port, "Sawt server ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    handle.shutdown().await;
    Ok(())
}

fn load_settings(args: &Args) -> anyhow::Result<SawtSettings> {
    let path = args.config.clone().unwrap_or_else(sawt_settings::settings_path);
    let mut settings = sawt_settings::load_settings_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;

    if let Some(host) = &args.host {
        settings.server.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    Ok(settings)
}

fn init_logging(settings: &SawtSettings) -> anyhow::Result<()> {
    let format: LogFormat = settings.logging.format.parse()?;
    let config = TelemetryConfig {
        format,
        ..TelemetryConfig::default()
    }
    .with_level_str(&settings.logging.level)?;

    sawt_telemetry::init_telemetry(&config)?;
    Ok(())
}
