//! Subprocess playback engine.
//!
//! Renders the stream by spawning an external player (ffplay by default).
//! Volume changes only take effect on the next `play`, the running process
//! is not remote-controlled.

use std::process::{Child, Command, Stdio};

use anyhow::{Result, anyhow, bail};
use tracing::{debug, info, warn};

use super::{EngineFactory, PlaybackEngine, RenderTarget, VOLUME_NOMINAL};

const DEFAULT_PLAYER: &str = "ffplay";

pub struct ProcessEngineFactory {
    program: String,
}

impl ProcessEngineFactory {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for ProcessEngineFactory {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER)
    }
}

impl EngineFactory for ProcessEngineFactory {
    fn create(&self) -> Result<Box<dyn PlaybackEngine>> {
        Ok(Box::new(ProcessEngine::new(&self.program)))
    }
}

pub struct ProcessEngine {
    program: String,
    url: Option<String>,
    target: RenderTarget,
    volume: u16,
    child: Option<Child>,
}

impl ProcessEngine {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            url: None,
            target: RenderTarget::default(),
            volume: VOLUME_NOMINAL,
            child: None,
        }
    }
}

impl PlaybackEngine for ProcessEngine {
    fn bind(&mut self, target: RenderTarget) -> Result<()> {
        self.target = target;
        Ok(())
    }

    fn load(&mut self, url: &str) -> Result<()> {
        if url.trim().is_empty() {
            bail!("cannot load an empty stream URL");
        }
        self.url = Some(url.to_string());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let url = self
            .url
            .as_ref()
            .ok_or_else(|| anyhow!("play called before load"))?;

        let mut command = Command::new(&self.program);
        command
            .arg("-loglevel")
            .arg("quiet")
            .arg("-rtsp_transport")
            .arg("tcp")
            .arg("-volume")
            .arg(self.volume.to_string())
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if self.target.0 != 0 {
            // SDL-based players honour this for embedding.
            command.env("SDL_WINDOWID", self.target.0.to_string());
        }

        let child = command
            .spawn()
            .map_err(|err| anyhow!("failed to spawn {}: {}", self.program, err))?;
        info!(
            program = self.program.as_str(),
            pid = child.id(),
            "Playback process started"
        );
        self.child = Some(child);
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    debug!(status = %status, "Playback process exited");
                    false
                }
                Err(err) => {
                    warn!(error = %err, "Cannot poll playback process");
                    false
                }
            },
            None => false,
        }
    }

    fn set_volume(&mut self, volume: u16) -> Result<()> {
        self.volume = volume;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                debug!(error = %err, "Playback process already gone");
            }
            let _ = child.wait();
        }
    }

    fn release(&mut self) {
        self.stop();
        self.url = None;
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_rejects_empty_url() {
        let mut engine = ProcessEngine::new("true");
        assert!(engine.load("  ").is_err());
    }

    #[test]
    fn play_before_load_fails() {
        let mut engine = ProcessEngine::new("true");
        assert!(engine.play().is_err());
    }

    #[test]
    fn spawn_failure_is_reported() {
        let mut engine = ProcessEngine::new("/nonexistent/player-binary");
        engine.load("rtsp://example/stream1").unwrap();
        assert!(engine.play().is_err());
    }

    #[test]
    fn stop_without_child_is_a_noop() {
        let mut engine = ProcessEngine::new("true");
        engine.stop();
        engine.release();
        assert!(!engine.is_playing());
    }
}
