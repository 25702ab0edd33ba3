//! # OculoDesk control layer
//!
//! Owns everything between the cloud API and the desktop shell:
//!
//! - the camera catalog ([`catalog`])
//! - the single stream session and its generation-gated lifecycle
//!   ([`session`])
//! - RTSP endpoint resolution from per-device profiles ([`endpoint`])
//! - the optimistic privacy toggle ([`toggle`])
//! - fire-and-forget pan/tilt and preset commands ([`commands`])
//!
//! The threading model is deliberately simple: one owning loop holds the
//! [`StreamController`] and calls [`StreamController::process_messages`];
//! every blocking call runs on a named worker thread that reports back over
//! a channel, tagged with the session generation it was started under.

pub mod catalog;
pub mod commands;
pub mod endpoint;
pub mod engine;
pub mod errors;
pub mod events;
pub mod model;
pub mod remote;
pub mod session;
pub mod toggle;

pub use catalog::{fetch_catalog, spawn_catalog_refresh};
pub use commands::{dispatch_move, dispatch_preset};
pub use endpoint::{StreamEndpoint, resolve_stream_endpoint};
pub use engine::{
    EngineFactory, PlaybackEngine, ProcessEngine, ProcessEngineFactory, RenderTarget,
    VOLUME_MUTED, VOLUME_NOMINAL,
};
pub use errors::ControlError;
pub use events::SessionEventBus;
pub use model::{Device, DeviceId, SessionEvent, SessionStatus};
pub use remote::CameraRemote;
pub use session::StreamController;
pub use toggle::OptimisticToggle;
