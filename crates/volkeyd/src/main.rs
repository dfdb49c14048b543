//! volkeyd: volume key and upload service
//!
//! Usage:
//!   volkeyd [--config volkey.toml] [--ip 0.0.0.0] [--port 5005] [--debug]

mod api;
mod daemon;
mod error;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::{info, warn};
use volkey_core::config::VolkeyConfig;

#[derive(Parser, Debug)]
#[command(name = "volkeyd", version, about = "Volume key and upload service")]
struct Cli {
    /// Path to volkey.toml configuration file
    #[arg(long, short = 'c', env = "VOLKEY_CONFIG", default_value = "volkey.toml")]
    config: PathBuf,

    /// Interface to bind (overrides server.listen)
    #[arg(long, env = "VOLKEY_IP")]
    ip: Option<IpAddr>,

    /// Port to bind (overrides server.listen)
    #[arg(long, env = "VOLKEY_PORT")]
    port: Option<u16>,

    /// Shorthand for --log debug
    #[arg(long)]
    debug: bool,

    /// Log level (trace, debug, info, warn, error); defaults to log.level
    #[arg(long, env = "VOLKEY_LOG")]
    log: Option<String>,

    /// Log format; defaults to log.format
    #[arg(long, env = "VOLKEY_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = VolkeyConfig::load(&cli.config)?;
    apply_overrides(&mut config, &cli)?;

    init_logging(&config.log.level, &log_format(&config));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "volkeyd starting"
    );
    if !cli.config.exists() {
        warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }

    daemon::run(config).await
}

/// Fold command-line flags into the loaded config. Flags win.
fn apply_overrides(config: &mut VolkeyConfig, cli: &Cli) -> Result<()> {
    if cli.ip.is_some() || cli.port.is_some() {
        let current = config.server.listen_addr()?;
        let addr = SocketAddr::new(
            cli.ip.unwrap_or(current.ip()),
            cli.port.unwrap_or(current.port()),
        );
        config.server.listen = addr.to_string();
    }

    if let Some(level) = &cli.log {
        config.log.level = level.clone();
    }
    if cli.debug {
        config.log.level = "debug".into();
    }
    if let Some(format) = &cli.log_format {
        config.log.format = match format {
            LogFormat::Json => "json".into(),
            LogFormat::Text => "text".into(),
        };
    }
    Ok(())
}

fn log_format(config: &VolkeyConfig) -> LogFormat {
    match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
