//! Stream session controller.
//!
//! One controller owns at most one visible stream. Every (re)start bumps a
//! generation counter; background workers tag everything they report with
//! the generation they were started under, and [`StreamController::process_messages`]
//! drops whatever no longer matches. The generation counter is the only
//! staleness authority, there is no cancellation handshake with workers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, info, warn};

use ocuconfig::StreamProfile;

use crate::endpoint::resolve_stream_endpoint;
use crate::engine::{EngineFactory, PlaybackEngine, RenderTarget, VOLUME_MUTED, VOLUME_NOMINAL};
use crate::errors::ControlError;
use crate::events::SessionEventBus;
use crate::model::{Device, DeviceId, SessionEvent, SessionStatus};
use crate::remote::CameraRemote;
use crate::toggle::OptimisticToggle;

const LIVENESS_INTERVAL: Duration = Duration::from_millis(200);

/// What background workers report back to the owning loop. Every variant
/// carries the generation it was produced under.
enum StateMsg {
    Connected {
        generation: u64,
    },
    Ended {
        generation: u64,
    },
    Failed {
        generation: u64,
        message: String,
    },
    PrivacyRollback {
        generation: u64,
        device: DeviceId,
        revert_to: bool,
    },
}

pub struct StreamController {
    factory: Arc<dyn EngineFactory>,
    remote: Arc<dyn CameraRemote>,
    engine: Arc<Mutex<Option<Box<dyn PlaybackEngine>>>>,
    generation: Arc<AtomicU64>,
    status: SessionStatus,
    current_device: Option<DeviceId>,
    muted: bool,
    privacy: OptimisticToggle,
    events: SessionEventBus,
    tx: Sender<StateMsg>,
    rx: Receiver<StateMsg>,
}

impl StreamController {
    pub fn new(factory: Arc<dyn EngineFactory>, remote: Arc<dyn CameraRemote>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            factory,
            remote,
            engine: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            status: SessionStatus::NoStream,
            current_device: None,
            muted: false,
            privacy: OptimisticToggle::default(),
            events: SessionEventBus::new(),
            tx,
            rx,
        }
    }

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn privacy_displayed(&self) -> bool {
        self.privacy.displayed()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Device of the current session, if one was started and not stopped.
    pub fn current_device(&self) -> Option<&DeviceId> {
        self.current_device.as_ref()
    }

    /// Seeds the displayed privacy state from device info, without going
    /// through the optimistic flip path.
    pub fn seed_privacy(&mut self, enabled: bool) {
        self.privacy.force(enabled);
    }

    /// Starts a stream for `device`, superseding whatever was playing.
    ///
    /// The previous engine is torn down and the generation bumped before
    /// anything else, so a failed start never leaves the old stream
    /// running. Endpoint resolution happens synchronously and surfaces as
    /// the returned error; everything network-bound runs on a worker
    /// thread and lands through [`Self::process_messages`].
    pub fn start_stream(
        &mut self,
        device: &Device,
        profile: &StreamProfile,
        target: RenderTarget,
    ) -> Result<(), ControlError> {
        self.teardown_engine();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.current_device = Some(device.id.clone());

        let endpoint = match resolve_stream_endpoint(device, profile) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                // No session was started, so no device is current either.
                self.current_device = None;
                if self.status != SessionStatus::NoStream {
                    self.set_status(generation, SessionStatus::NoStream);
                }
                return Err(err);
            }
        };
        self.set_status(generation, SessionStatus::Connecting);
        info!(
            device = device.id.as_str(),
            generation,
            url = endpoint.redacted().as_str(),
            "Starting stream session"
        );

        let factory = Arc::clone(&self.factory);
        let slot = Arc::clone(&self.engine);
        let shared_generation = Arc::clone(&self.generation);
        let muted = self.muted;
        let tx = self.tx.clone();
        let url = endpoint.url;
        thread::Builder::new()
            .name(format!("stream-{generation}"))
            .spawn(move || {
                run_stream_worker(
                    factory,
                    slot,
                    shared_generation,
                    generation,
                    url,
                    target,
                    muted,
                    tx,
                );
            })
            .map_err(|err| ControlError::Playback(format!("cannot spawn stream worker: {err}")))?;
        Ok(())
    }

    /// Stops the current stream, if any. Idempotent.
    pub fn stop_stream(&mut self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.current_device = None;
        self.teardown_engine();
        if self.status != SessionStatus::NoStream {
            self.set_status(generation, SessionStatus::NoStream);
        }
    }

    /// Drains worker reports and applies the ones that are still current.
    /// Call this from the owning loop, it never blocks.
    pub fn process_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            let current = self.generation.load(Ordering::SeqCst);
            match msg {
                StateMsg::Connected { generation } => {
                    if generation != current {
                        debug!(generation, current, "Dropping stale connect report");
                        continue;
                    }
                    self.set_status(generation, SessionStatus::Playing);
                }
                StateMsg::Ended { generation } => {
                    if generation != current {
                        continue;
                    }
                    self.teardown_engine();
                    self.set_status(generation, SessionStatus::Ended);
                }
                StateMsg::Failed {
                    generation,
                    message,
                } => {
                    if generation != current {
                        debug!(generation, current, "Dropping stale failure report");
                        continue;
                    }
                    self.teardown_engine();
                    warn!(error = message.as_str(), "Stream session failed");
                    self.set_status(generation, SessionStatus::Error(message));
                }
                StateMsg::PrivacyRollback {
                    generation,
                    device,
                    revert_to,
                } => {
                    if generation != current {
                        debug!(
                            device = device.as_str(),
                            "Dropping privacy rollback from a previous session"
                        );
                        continue;
                    }
                    self.privacy.force(revert_to);
                    self.events.broadcast(SessionEvent::PrivacyChanged {
                        device,
                        enabled: revert_to,
                    });
                }
            }
        }
    }

    /// Mutes or unmutes the running stream. Remembered across sessions, so
    /// a stream started while muted comes up silent.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        {
            let mut slot = self.engine.lock().unwrap();
            if let Some(engine) = slot.as_mut() {
                let volume = if muted { VOLUME_MUTED } else { VOLUME_NOMINAL };
                if let Err(err) = engine.set_volume(volume) {
                    warn!(error = %err, "Cannot adjust stream volume");
                }
            }
        }
        self.events.broadcast(SessionEvent::MuteChanged { muted });
    }

    /// Flips privacy mode optimistically: the displayed state changes now,
    /// the cloud call runs in the background and only a failure forces the
    /// display back.
    pub fn toggle_privacy(&mut self, device: &DeviceId) {
        let enabled = self.privacy.flip();
        let revert_to = !enabled;
        self.events.broadcast(SessionEvent::PrivacyChanged {
            device: device.clone(),
            enabled,
        });

        let generation = self.generation.load(Ordering::SeqCst);
        let remote = Arc::clone(&self.remote);
        let tx = self.tx.clone();
        let worker_device = device.clone();
        let spawned = thread::Builder::new()
            .name(format!("privacy-{device}"))
            .spawn(move || {
                if let Err(err) = remote.set_privacy_mode(&worker_device, enabled) {
                    warn!(
                        device = worker_device.as_str(),
                        error = %err,
                        "Privacy toggle rejected, reverting"
                    );
                    let _ = tx.send(StateMsg::PrivacyRollback {
                        generation,
                        device: worker_device,
                        revert_to,
                    });
                }
            });
        if let Err(err) = spawned {
            warn!(error = %err, "Cannot spawn privacy worker");
            self.privacy.force(revert_to);
            self.events.broadcast(SessionEvent::PrivacyChanged {
                device: device.clone(),
                enabled: revert_to,
            });
        }
    }

    fn set_status(&mut self, generation: u64, status: SessionStatus) {
        self.status = status.clone();
        self.events
            .broadcast(SessionEvent::StatusChanged { generation, status });
    }

    fn teardown_engine(&mut self) {
        let taken = self.engine.lock().unwrap().take();
        if let Some(mut engine) = taken {
            engine.stop();
            engine.release();
        }
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.teardown_engine();
    }
}

/// Brings a stream up and then watches it until it dies or is superseded.
///
/// The engine only becomes visible to the controller once it is playing and
/// the generation is still current; a superseded worker releases its engine
/// without ever installing it.
#[allow(clippy::too_many_arguments)]
fn run_stream_worker(
    factory: Arc<dyn EngineFactory>,
    slot: Arc<Mutex<Option<Box<dyn PlaybackEngine>>>>,
    shared_generation: Arc<AtomicU64>,
    generation: u64,
    url: String,
    target: RenderTarget,
    muted: bool,
    tx: Sender<StateMsg>,
) {
    let mut engine = match factory.create() {
        Ok(engine) => engine,
        Err(err) => {
            let _ = tx.send(StateMsg::Failed {
                generation,
                message: format!("cannot create playback engine: {err}"),
            });
            return;
        }
    };

    let startup = (|| {
        engine.bind(target)?;
        engine.load(&url)?;
        engine.set_volume(if muted { VOLUME_MUTED } else { VOLUME_NOMINAL })?;
        engine.play()
    })();
    if let Err(err) = startup {
        engine.release();
        let _ = tx.send(StateMsg::Failed {
            generation,
            message: err.to_string(),
        });
        return;
    }

    {
        let mut slot = slot.lock().unwrap();
        if shared_generation.load(Ordering::SeqCst) != generation {
            drop(slot);
            debug!(generation, "Stream superseded during startup");
            engine.stop();
            engine.release();
            return;
        }
        *slot = Some(engine);
    }
    let _ = tx.send(StateMsg::Connected { generation });

    loop {
        thread::sleep(LIVENESS_INTERVAL);
        let alive = {
            let mut slot = slot.lock().unwrap();
            // Checked under the lock: a supersede after the sleep must not
            // let this worker poll the next generation's engine.
            if shared_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            match slot.as_mut() {
                Some(engine) => engine.is_playing(),
                // The controller already took the engine away.
                None => return,
            }
        };
        if !alive {
            debug!(generation, "Stream pipeline stopped producing");
            let _ = tx.send(StateMsg::Ended { generation });
            return;
        }
    }
}
