use crate::song::SongSource;
use anyhow::Result;
use std::time::Duration;

/// The unified interface for anything that can actually make sound.
///
/// The controller never touches a device directly; it loads a source here,
/// asks it to play/pause/seek, and polls `is_finished` for end-of-track.
/// `play` is fallible on purpose: the controller only flips to `Playing`
/// once the backend confirms the start.
pub trait MediaSource {
    fn load(&mut self, source: &SongSource) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position: Duration) -> Result<()>;
    fn set_volume(&mut self, volume: f32);
    fn position(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    fn is_finished(&self) -> bool;
}

/// Inert backend used when no audio device is available. Every operation
/// succeeds and nothing plays, so the rest of the app keeps working.
#[derive(Default)]
pub struct SilentMedia {
    loaded: bool,
}

impl MediaSource for SilentMedia {
    fn load(&mut self, _source: &SongSource) -> Result<()> {
        self.loaded = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn stop(&mut self) {
        self.loaded = false;
    }

    fn seek(&mut self, _position: Duration) -> Result<()> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn position(&self) -> Duration {
        Duration::ZERO
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn is_finished(&self) -> bool {
        false
    }
}
