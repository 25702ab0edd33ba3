//! OculoDesk: terminal front-end for the vendor cloud cameras.
//!
//! Lists the account's cameras, opens a stream for one of them and then
//! accepts line commands (mute, privacy, pan/tilt, presets) until the
//! stream dies or the user quits.

use std::env;
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, unbounded};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ocuapi::{Axis, ClientAuth, CloudClient};
use ocuconfig::Config;
use ocucontrol::engine::{ProcessEngineFactory, RenderTarget};
use ocucontrol::{
    CameraRemote, Device, SessionEvent, SessionStatus, StreamController, dispatch_move,
    dispatch_preset, fetch_catalog, spawn_catalog_refresh,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ========== Phase 1: configuration and cloud client ==========

    let config = Config::load("")?;
    if !config.credentials().is_configured() {
        bail!(
            "No cloud credentials. Put authorization and terminal_id in {}/config.yaml",
            config.config_dir().display()
        );
    }
    let credentials = config.credentials().clone();
    let client = Arc::new(CloudClient::new(ClientAuth::new(
        credentials.authorization,
        credentials.terminal_id,
    )));

    // ========== Phase 2: camera catalog ==========

    info!("📡 Fetching camera catalog...");
    let devices = fetch_catalog(&client).context("cannot list cameras")?;
    if devices.is_empty() {
        bail!("No cameras registered on this account");
    }
    for device in &devices {
        info!("  - {} [{}] ({})", device.alias, device.model, device.id);
    }

    let mut profiles = ocuconfig::StreamProfileStore::open(config.config_dir());
    let known_ids: Vec<String> = devices.iter().map(|d| d.id.as_str().to_string()).collect();
    if let Err(err) = profiles.retain(&known_ids) {
        warn!(error = %err, "Cannot prune stale stream profiles");
    }

    let device = select_device(&devices, env::args().nth(1).as_deref());
    info!("✅ Watching camera '{}'", device.alias);
    match client.presets(device.id.as_str()) {
        Ok(presets) => {
            for preset in &presets {
                info!("  preset {}: {}", preset.id, preset.name);
            }
        }
        Err(err) => warn!(error = %err, "Cannot list presets"),
    }
    if !profiles.contains(device.id.as_str()) {
        warn!(
            device = device.id.as_str(),
            "No stream profile yet; streaming will fail until one is saved"
        );
    }

    // ========== Phase 3: stream session ==========

    let remote: Arc<dyn CameraRemote> = Arc::clone(&client) as Arc<dyn CameraRemote>;
    let mut controller = StreamController::new(
        Arc::new(ProcessEngineFactory::default()),
        Arc::clone(&remote),
    );
    let events = controller.subscribe();
    let profile = profiles.get(device.id.as_str());
    controller.start_stream(&device, &profile, RenderTarget::default())?;

    info!(
        "Commands: mute | unmute | privacy | left | right | up | down | preset <id> | refresh | quit"
    );
    let stdin = spawn_stdin_reader();
    let mut catalog_refresh: Option<Receiver<Result<Vec<Device>>>> = None;

    loop {
        controller.process_messages();
        if let Some(rx) = catalog_refresh.take() {
            match rx.try_recv() {
                Ok(Ok(devices)) => {
                    for device in &devices {
                        info!("  - {} [{}] ({})", device.alias, device.model, device.id);
                    }
                }
                Ok(Err(err)) => warn!(error = %err, "Catalog refresh failed"),
                Err(crossbeam_channel::TryRecvError::Empty) => catalog_refresh = Some(rx),
                Err(crossbeam_channel::TryRecvError::Disconnected) => {}
            }
        }
        let mut session_over = false;
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::StatusChanged { status, .. } => {
                    info!(status = status.as_str(), "Session status changed");
                    if matches!(status, SessionStatus::Ended | SessionStatus::Error(_)) {
                        session_over = true;
                    }
                }
                SessionEvent::MuteChanged { muted } => {
                    info!(muted, "Mute changed");
                }
                SessionEvent::PrivacyChanged { device, enabled } => {
                    info!(device = device.as_str(), enabled, "Privacy mode changed");
                }
            }
        }
        if session_over {
            break;
        }

        match stdin.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => {
                let line = line.trim();
                match line {
                    "" => {}
                    "quit" | "q" => break,
                    "refresh" => {
                        catalog_refresh = Some(spawn_catalog_refresh(Arc::clone(&client)));
                    }
                    "mute" => controller.set_muted(true),
                    "unmute" => controller.set_muted(false),
                    "privacy" => controller.toggle_privacy(&device.id),
                    "left" => dispatch_move(Arc::clone(&remote), device.id.clone(), Axis::Pan, -10),
                    "right" => dispatch_move(Arc::clone(&remote), device.id.clone(), Axis::Pan, 10),
                    "up" => dispatch_move(Arc::clone(&remote), device.id.clone(), Axis::Tilt, 10),
                    "down" => {
                        dispatch_move(Arc::clone(&remote), device.id.clone(), Axis::Tilt, -10)
                    }
                    _ => {
                        if let Some(preset) = line.strip_prefix("preset ") {
                            dispatch_preset(
                                Arc::clone(&remote),
                                device.id.clone(),
                                preset.trim().to_string(),
                            );
                        } else {
                            warn!(command = line, "Unknown command");
                        }
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    controller.stop_stream();
    controller.process_messages();
    info!("Bye");
    Ok(())
}

/// Picks the camera matching `wanted` by id or alias, defaulting to the
/// first one in account order.
fn select_device(devices: &[Device], wanted: Option<&str>) -> Device {
    if let Some(wanted) = wanted {
        if let Some(found) = devices
            .iter()
            .find(|d| d.id.as_str() == wanted || d.alias == wanted)
        {
            return found.clone();
        }
        warn!(wanted, "No such camera, falling back to the first one");
    }
    devices[0].clone()
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    // Detached on purpose: a blocked read on stdin ends with the process.
    let _ = thread::Builder::new().name("stdin".to_string()).spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
                Err(_) => return,
            }
        }
    });
    rx
}
