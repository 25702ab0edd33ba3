//! Playback engine seam.
//!
//! The session controller drives whatever renders the RTSP stream through
//! [`PlaybackEngine`], so the real subprocess player and the test doubles
//! share one contract.

use anyhow::Result;

pub mod process;

pub use process::{ProcessEngine, ProcessEngineFactory};

/// Native handle of the surface the video is rendered into. Zero means
/// "detached", the engine picks its own window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderTarget(pub u64);

pub const VOLUME_MUTED: u16 = 0;
pub const VOLUME_NOMINAL: u16 = 100;

/// One live playback pipeline. Created per stream attempt, never reused.
pub trait PlaybackEngine: Send {
    /// Attaches the engine output to `target`.
    fn bind(&mut self, target: RenderTarget) -> Result<()>;

    /// Points the engine at `url` without starting playback.
    fn load(&mut self, url: &str) -> Result<()>;

    /// Starts playback of the loaded URL.
    fn play(&mut self) -> Result<()>;

    /// Whether the pipeline is still producing output.
    fn is_playing(&mut self) -> bool;

    fn set_volume(&mut self, volume: u16) -> Result<()>;

    /// Stops playback. Idempotent.
    fn stop(&mut self);

    /// Tears the pipeline down. Idempotent, called exactly once per
    /// engine by the controller.
    fn release(&mut self);
}

/// Builds fresh engines for the session controller.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn PlaybackEngine>>;
}
