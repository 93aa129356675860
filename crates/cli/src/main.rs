//! hookrelay entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load `hookrelay.toml` and the environment, then
//!    validate once.
//! 2. **Wire observability**: configure `tracing-subscriber` with a JSON (or
//!    plain) layer and an optional OpenTelemetry OTLP exporter. All `tracing`
//!    spans and events emitted by every crate in the workspace flow through it.
//! 3. **Construct infrastructure**: create the `reqwest` downstream client and
//!    inject it into [`bridge::Relay`].
//! 4. **Select the command**:
//!    - `serve` (default): run the relay and liveness surfaces.
//!    - `translate`: convert one event document offline and print the result.
//!    - `echo-backend`: run a local stand-in for the downstream service.

mod config;
mod telemetry;

use std::{
    io::{Read, Write},
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use bridge::Relay;
use clap::{Parser, Subcommand};
use downstream::HttpDownstream;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    config::{Config, CONFIG_FILE},
    telemetry::TelemetrySettings,
};

#[derive(Parser, Debug)]
#[command(name = "hookrelay")]
#[command(version)]
#[command(about = "Relays pull-request events to a chat incoming webhook", long_about = None)]
struct Args {
    /// Configuration file (optional; environment variables take precedence)
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay and liveness HTTP surfaces (default)
    Serve,

    /// Translate one pull-request event document and print the notification
    Translate {
        /// Event file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Run a local stand-in for the downstream incoming-webhook service
    EchoBackend {
        /// Listen address
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        listen: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&args.config).await,
        Commands::Translate { file } => translate(file),
        Commands::EchoBackend { listen } => echo_backend(&args.config, listen).await,
    }
}

fn telemetry_settings(config: &Config) -> Result<TelemetrySettings> {
    Ok(TelemetrySettings {
        level: config.log_filter()?,
        json: config.log_json,
        otlp_endpoint: config.otlp_endpoint.clone(),
    })
}

async fn serve(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path)?;
    config.validate().context("Invalid configuration")?;
    let _telemetry = telemetry::init(&telemetry_settings(&config)?)?;

    let settings = config.to_relay_settings()?;
    info!(
        scheme = %settings.endpoint.scheme,
        host = %settings.endpoint.host,
        log_level = %config.log_level,
        trace_level = config.trace_level,
        "Starting hookrelay"
    );

    let client = HttpDownstream::new(&config.to_client_config())
        .context("Failed to create downstream client")?;
    let relay = Arc::new(Relay::new(settings, Arc::new(client)));

    listener::serve(config.to_serve_settings(), relay)
        .await
        .context("HTTP server failed")?;

    info!("hookrelay shutdown complete");
    Ok(())
}

fn translate(file: Option<PathBuf>) -> Result<()> {
    telemetry::init_stderr(LevelFilter::WARN)?;

    let input = match &file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let notification = bridge::translate(&input).context("Failed to translate event")?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&notification)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

async fn echo_backend(config_path: &Path, listen: SocketAddr) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let _telemetry = telemetry::init(&telemetry_settings(&config)?)?;

    info!(%listen, "Starting echo backend");
    listener::serve_echo(listen, config.redaction_policy()?)
        .await
        .context("Echo backend failed")
}
