//! Texnouz OCPI node, CLI server
//!
//! Headless OCPI 2.1.1 / 2.2 credentials endpoint suitable for deployment
//! as a systemd service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/texnouz-ocpi/config.toml)
//! ocpi-service
//!
//! # Custom config path
//! ocpi-service --config /etc/texnouz-ocpi/config.toml
//!
//! # Validate config without starting
//! ocpi-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use texnouz_ocpi::config::AppConfig;
use texnouz_ocpi::server::{init_tracing, ServerHandle, ServerOptions};

/// Texnouz OCPI node: credentials handshake and remote party registry.
#[derive(Parser, Debug)]
#[command(
    name = "ocpi-service",
    version,
    about = "OCPI credentials endpoint and remote party registry",
    long_about = "Texnouz OCPI node. Serves the OCPI versions and credentials \
                  modules, registers with counter-parties and manages their tokens.\n\n\
                  Default config: ~/.config/texnouz-ocpi/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "OCPI_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(texnouz_ocpi::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(mut cfg) => {
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            // Init tracing first so subsequent logs are formatted properly
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) if cli.check => return Err(e.into()),
        Err(e) => {
            // Fallback tracing init
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        // Applied before tracing init above
        info!("CLI override: log_level = {}", level);
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Party       : {}", config.party.identity());
        println!("   API address : {}:{}", config.server.host, config.server.port);
        println!("   Public URL  : {}", config.public_url());
        println!("   Database    : {}", config.database.url);
        println!("   Log level   : {}", config.logging.level);
        println!(
            "   Admin API   : {}",
            if config.admin.api_key.is_some() { "enabled" } else { "disabled" }
        );
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        in_memory: false,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
