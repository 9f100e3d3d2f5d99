//! Trackside controller binary.
//!
//! Boots the device world against the mock line bank (hardware line banks
//! are deployment-specific implementations of the `LineBank` trait), seeds
//! any configured devices, and serves the REST API until a shutdown is
//! accepted. A restart tears the whole stack down, rebuilds it from the
//! configuration, and serves again; a halt exits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use rs_trackside::config::Config;
use rs_trackside::hal::MockLineBank;
use rs_trackside::services::{self, ShutdownKind, TracksideCore, TracksideState, WebServerConfig};
use rs_trackside::traits::LineBank;

const ENV_FILE: &str = ".env";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("========================================");
    println!("  rs-trackside - Device Control API");
    println!("========================================");
    println!();

    let config = match Config::from_env_file(ENV_FILE) {
        Ok(config) => {
            tracing::info!(file = ENV_FILE, "configuration loaded");
            config
        }
        Err(err) => {
            tracing::info!(file = ENV_FILE, error = %err, "no env file, using defaults");
            Config::default()
        }
    };

    if !config.web.enabled {
        anyhow::bail!("web server disabled in configuration, nothing to serve");
    }

    loop {
        let mut bank = MockLineBank::new();
        let busy_led = config.system.busy_pin.and_then(|pin| match bank.claim(pin) {
            Ok(line) => Some(line),
            Err(err) => {
                tracing::warn!(pin, error = %err, "busy LED unavailable");
                None
            }
        });

        let mut core = TracksideCore::new(bank, config.turnout);
        core.seed(&config.seed).await;
        tracing::info!(
            signals = core.signals.len(),
            turnouts = core.turnouts.len(),
            "device world ready"
        );

        let state = Arc::new(TracksideState::new(
            core,
            busy_led,
            Duration::from_millis(config.system.shutdown_grace_ms),
        ));

        let kind = services::run_server(state, WebServerConfig::from_config(&config.web)).await?;
        match kind {
            ShutdownKind::Halt => {
                tracing::info!("halted");
                break;
            }
            ShutdownKind::Restart => {
                tracing::info!("restarting");
            }
        }
    }

    Ok(())
}
