//! Lumabeat Server - LED-matrix spectrum visualizer daemon.
//!
//! Watches the media player on the session bus, drives the spectrum
//! analyzer and the display's frame stream accordingly, and serves the
//! control protocol on a local Unix socket.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lumabeat_core::{bootstrap_services, ControlServer};
use tokio::signal;

use crate::config::ServerConfig;

/// Lumabeat Server - spectrum visualizer with track information.
#[derive(Parser, Debug)]
#[command(name = "lumabeat-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "LUMABEAT_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Path of the control socket (overrides config file).
    #[arg(short, long, env = "LUMABEAT_SOCKET")]
    socket: Option<PathBuf>,

    /// Hostname of the display device (overrides config file).
    #[arg(short = 't', long)]
    hostname: Option<String>,

    /// UDP port of the frame listener on the display device.
    #[arg(short = 'p', long)]
    udp_port: Option<u16>,

    /// Always show the visualizer, instead of only while music is playing.
    #[arg(short = 'a', long)]
    always_on: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Lumabeat Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(socket) = args.socket {
        config.socket_path = socket;
    }
    if let Some(hostname) = args.hostname {
        config.hostname = hostname;
    }
    if let Some(port) = args.udp_port {
        config.udp_port = port;
    }
    if args.always_on {
        config.always_on = true;
    }

    log::info!(
        "Configuration: display={}:{}, socket={}, always_on={}",
        config.hostname,
        config.udp_port,
        config.socket_path.display(),
        config.always_on
    );

    // Bootstrap services: UDP dial, session-bus subscription, wiring.
    let core_config = config.to_core_config();
    let mut services = bootstrap_services(&core_config)
        .await
        .context("Failed to bootstrap services")?;

    log::info!("Services bootstrapped successfully");

    // Apply the initial visualizer state and start the playback event pump.
    services.start_background_tasks().await;

    // Bind the control socket and serve commands in the background.
    let control = ControlServer::bind(
        &core_config.socket_path,
        services.coordinator.clone(),
        services.cancel_token.clone(),
    )
    .context("Failed to bind control socket")?;

    let control_handle = tokio::spawn(async move {
        if let Err(e) = control.run().await {
            log::error!("Control server error: {}", e);
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");

    // Graceful shutdown: stop the loops and blank the display.
    services.shutdown().await;

    // Abort the accept loop (it will have stopped when the token fired)
    control_handle.abort();

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
