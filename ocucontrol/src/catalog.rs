//! Device catalog.
//!
//! The catalog is a snapshot, not a live registry: the cloud has no push
//! channel, so we list device ids and fetch details one by one. A camera
//! whose details cannot be fetched is skipped with a warning rather than
//! failing the whole listing.

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use crossbeam_channel::{Receiver, bounded};
use ocuapi::CloudClient;
use tracing::{info, warn};

use crate::model::{Device, DeviceId};

/// Fetches the full catalog, blocking. Device order follows the account's
/// device order listing.
pub fn fetch_catalog(client: &CloudClient) -> Result<Vec<Device>> {
    let ids = client.list_devices()?;
    let mut devices = Vec::with_capacity(ids.len());
    for id in ids {
        match client.device_details(&id) {
            Ok(details) => devices.push(Device::from_details(DeviceId(id), details)),
            Err(err) => {
                warn!(device = id.as_str(), error = %err, "Skipping camera, details unavailable");
            }
        }
    }
    info!(count = devices.len(), "Camera catalog refreshed");
    Ok(devices)
}

/// Refreshes the catalog on a worker thread and delivers the result on the
/// returned channel. A dropped receiver just ends the worker quietly.
pub fn spawn_catalog_refresh(client: Arc<CloudClient>) -> Receiver<Result<Vec<Device>>> {
    let (tx, rx) = bounded(1);
    let spawned = thread::Builder::new()
        .name("catalog-refresh".to_string())
        .spawn(move || {
            let _ = tx.send(fetch_catalog(&client));
        });
    if let Err(err) = spawned {
        warn!(error = %err, "Cannot spawn catalog worker");
    }
    rx
}
