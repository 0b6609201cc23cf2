//! megad-i2c-gateway - MegaD I2C sensor bus poller
//!
//! Polls the I2C sensors wired to one MegaD controller port over HTTP and
//! keeps an in-process state model of the latest decoded readings.

mod config;
mod error;
mod megad;
mod state;

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::megad::{MegaDClient, PollerConfig, SensorPoller};
use crate::state::StateStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "megad_i2c_gateway=info".into()),
        )
        .init();

    tracing::info!("Starting megad-i2c-gateway...");

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!(
        "Polling {} port {} scl {} every {} sec ({:?} mode)",
        config.device.host,
        config.device.port,
        config.device.scl,
        config.poll.refresh_secs,
        config.poll.mode
    );

    let client = Arc::new(MegaDClient::new(&config.device));
    let store = Arc::new(StateStore::new(config.poll.channels.iter().copied()));

    let poller = SensorPoller::new(
        PollerConfig {
            refresh_interval: config.poll.refresh_interval(),
            mode: config.poll.mode,
        },
        client,
        store.clone(),
    );
    poller.start();

    // SIGHUP forces an immediate out-of-cycle refresh of every subscribed
    // channel; ctrl-c shuts down.
    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, refreshing all channels");
                poller.refresh_all().await;
            }
        }
    }

    poller.stop();
    tracing::info!(
        "Shutting down with {} readings in the store",
        store.snapshot().await.len()
    );

    Ok(())
}
