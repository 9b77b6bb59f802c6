use crate::media::MediaSource;
use crate::song::SongSource;
use anyhow::{anyhow, bail, Context, Result};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Local playback through a rodio sink. Loading swaps the decoder into the
/// sink paused; `play` resumes it. Seeking a drained sink re-appends the
/// decoder first so restart-after-end keeps working.
pub struct RodioMedia {
    _stream: OutputStream,
    sink: Sink,
    path: Option<PathBuf>,
    duration: Option<Duration>,
}

impl RodioMedia {
    pub fn new() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("no audio output device available")?;
        let sink = Sink::try_new(&handle).context("failed to open audio sink")?;
        sink.pause();

        Ok(Self {
            _stream: stream,
            sink,
            path: None,
            duration: None,
        })
    }

    fn decode(path: &Path) -> Result<Decoder<BufReader<File>>> {
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Decoder::new(BufReader::new(file))
            .with_context(|| format!("failed to decode {}", path.display()))
    }

    /// Put a fresh decoder for the current path into the sink, paused.
    fn rebuild(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            bail!("no track loaded");
        };
        let source = Self::decode(&path)?;
        self.sink.clear();
        self.sink.append(source);
        Ok(())
    }
}

impl MediaSource for RodioMedia {
    fn load(&mut self, source: &SongSource) -> Result<()> {
        let path = match source {
            SongSource::File(path) => path.clone(),
            SongSource::Remote(url) => {
                bail!("remote sources are not playable here: {url}");
            }
        };

        let decoder = Self::decode(&path)?;
        self.duration = decoder.total_duration();
        self.sink.clear();
        self.sink.append(decoder);
        self.path = Some(path);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.path.is_none() {
            bail!("nothing loaded");
        }
        if self.sink.empty() {
            self.rebuild()?;
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.clear();
        self.path = None;
        self.duration = None;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        if self.sink.empty() {
            self.rebuild()?;
        }
        self.sink
            .try_seek(position)
            .map_err(|e| anyhow!("seek failed: {e}"))
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.path.is_some() && self.sink.empty()
    }
}
