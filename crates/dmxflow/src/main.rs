//! DmxFlow - DMX-to-LAN Smart Lighting Bridge
//!
//! Listens for Art-Net and sACN DMX streams, arbitrates between sources per
//! universe, maps channels onto smart-light device fields, and emits
//! debounced device updates.

#![warn(missing_docs)]

mod config;
mod logging_setup;
mod store;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};

use dmxflow_core::DmxFrame;
use dmxflow_io::{ArtNetListener, SacnListener};
use dmxflow_map::{DeviceRegistry, MappingResolver};
use dmxflow_service::{DeviceUpdate, MappingService, UpdateSink};

use crate::config::BridgeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dmxflow.toml".to_string());
    let config = BridgeConfig::load(Path::new(&config_path))?;
    let _log_guard = logging_setup::init(&config.log)?;
    info!(config = %config_path, "DmxFlow starting");

    // Devices and mappings come from the persisted state file; everything
    // else repopulates from live traffic.
    let state = store::load_or_default(&config.store.path)
        .with_context(|| format!("failed to load {}", config.store.path.display()))?;
    let registry = Arc::new(DeviceRegistry::new());
    for (device_id, capabilities) in &state.devices {
        registry.insert(device_id.clone(), *capabilities);
    }
    let resolver = MappingResolver::new(registry.clone());
    let restored = resolver.restore(state.mappings);
    info!(
        devices = registry.len(),
        mappings = restored,
        "bridge state restored"
    );

    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<DeviceUpdate>();
    let service = Arc::new(MappingService::new(
        config.service,
        resolver.tables(),
        registry,
        Arc::new(update_tx) as Arc<dyn UpdateSink>,
    ));

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<DmxFrame>();
    let mut listeners = Vec::new();

    if config.artnet.enabled {
        let listener = ArtNetListener::bind(config.artnet.bind, config.service.artnet_priority)
            .await
            .context("failed to bind Art-Net listener")?;
        let frames = frame_tx.clone();
        listeners.push(tokio::spawn(async move {
            if let Err(err) = listener.run(frames).await {
                error!(error = %err, "Art-Net listener failed");
            }
        }));
    }

    if config.sacn.enabled {
        let listener = SacnListener::bind(config.sacn.bind, &config.sacn.universes)
            .await
            .context("failed to bind sACN listener")?;
        let frames = frame_tx.clone();
        listeners.push(tokio::spawn(async move {
            if let Err(err) = listener.run(frames).await {
                error!(error = %err, "sACN listener failed");
            }
        }));
    }
    drop(frame_tx);

    let sweeper = tokio::spawn(service.clone().run_sweeper());

    let pump_service = service.clone();
    let pump = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            pump_service.submit_frame(frame);
        }
    });

    // Device senders would attach here; the bridge core just reports what
    // it would send.
    let drain = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            info!(device_id = %update.device_id, fields = ?update.fields, "device update");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    for listener in &listeners {
        listener.abort();
    }
    sweeper.abort();
    pump.abort();
    service.shutdown();

    // Write back the validated state; mappings that failed to restore are
    // dropped from the file rather than resurrected on every start.
    let snapshot = store::BridgeFile {
        version: store::FILE_VERSION,
        devices: state.devices,
        mappings: resolver.records(),
    };
    if let Err(err) = store::save(&config.store.path, &snapshot) {
        error!(error = %err, "failed to write state file");
    }

    // Let the update drain report the final flush before exiting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    drain.abort();

    info!("DmxFlow stopped");
    Ok(())
}
