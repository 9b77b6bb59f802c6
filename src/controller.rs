use crate::media::MediaSource;
use crate::playlist::Playlist;
use crate::song::{Song, SongId};
use crate::tags::TagInfo;
use crate::theme::Theme;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;
use tracing::{debug, warn};

/// Pressing "previous" after this much playback restarts the current track
/// instead of jumping back a song.
const REWIND_THRESHOLD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RepeatMode {
    List,
    Single,
    Off,
}

impl Default for RepeatMode {
    fn default() -> Self {
        Self::Off
    }
}

impl RepeatMode {
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::List => RepeatMode::Single,
            RepeatMode::Single => RepeatMode::Off,
            RepeatMode::Off => RepeatMode::List,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

/// Outcome of an index-transition decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    To(usize),
    RestartCurrent,
    Stop,
}

/// Notifications for the view layer. The controller has no IO side effects
/// of its own; whoever renders subscribes and reacts.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The song under the cursor changed (index move, reload, or removal).
    SongChanged(Option<usize>),
    PlaybackChanged(PlaybackStatus),
    PlaybackError(String),
}

/// Owns the playlist, the cursor and the play/pause/shuffle/repeat state,
/// and drives a [`MediaSource`] accordingly.
pub struct PlaybackController {
    playlist: Playlist,
    cursor: Option<usize>,
    status: PlaybackStatus,
    shuffle: bool,
    repeat: RepeatMode,
    volume: f32,
    muted: bool,
    saved_volume: f32,
    last_error: Option<String>,
    media: Box<dyn MediaSource>,
    subscribers: Vec<Sender<ControllerEvent>>,
}

impl PlaybackController {
    pub fn new(media: Box<dyn MediaSource>) -> Self {
        Self {
            playlist: Playlist::new(),
            cursor: None,
            status: PlaybackStatus::Stopped,
            shuffle: false,
            repeat: RepeatMode::default(),
            volume: 1.0,
            muted: false,
            saved_volume: 1.0,
            last_error: None,
            media,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<ControllerEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: ControllerEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            self.status = status;
            self.emit(ControllerEvent::PlaybackChanged(status));
        }
    }

    // ===============
    //   List edits
    // =============

    /// Replaces the playlist. The cursor lands on the first song (or goes
    /// empty); playback does not start on its own.
    pub fn load(&mut self, songs: Vec<Song>) {
        self.media.stop();
        self.set_status(PlaybackStatus::Stopped);
        self.playlist.replace(songs);
        self.cursor = if self.playlist.is_empty() { None } else { Some(0) };

        if let Some(song) = self.current_song() {
            let source = song.source.clone();
            if let Err(e) = self.media.load(&source) {
                warn!("failed to load first track: {e}");
            }
        }
        let cursor = self.cursor;
        self.emit(ControllerEvent::SongChanged(cursor));
    }

    /// Appends a song. If the list was empty it becomes the current item,
    /// but whether to start playing is the caller's call.
    pub fn add(&mut self, song: Song) {
        self.playlist.push(song);
        if self.cursor.is_none() {
            self.cursor = Some(0);
            self.reload_current();
        }
    }

    /// Removes the song at `index`, keeping the cursor coherent:
    /// removing the current song clamps the cursor and reloads whatever now
    /// sits under it; removing an earlier song shifts the cursor down so the
    /// playing track keeps its identity; removing a later song is invisible.
    pub fn remove_at(&mut self, index: usize) -> Option<Song> {
        let removed = self.playlist.remove(index)?;

        match self.cursor {
            Some(cur) if index == cur => {
                if self.playlist.is_empty() {
                    self.cursor = None;
                    self.media.stop();
                    self.set_status(PlaybackStatus::Stopped);
                    self.emit(ControllerEvent::SongChanged(None));
                } else {
                    let clamped = if cur >= self.playlist.len() { 0 } else { cur };
                    self.cursor = Some(clamped);
                    self.reload_current();
                }
            }
            Some(cur) if index < cur => {
                self.cursor = Some(cur - 1);
                let cursor = self.cursor;
                self.emit(ControllerEvent::SongChanged(cursor));
            }
            _ => {}
        }

        Some(removed)
    }

    // ====================
    //   Index decisions
    // ==================

    /// Where would "next" go? Shuffle picks uniformly among the other
    /// indices (only excluding an immediate repeat); sequential wraps to 0
    /// under list-repeat and stops otherwise. Single-repeat is deliberately
    /// ignored here: a manual skip should actually skip.
    pub fn next_index(&self) -> Advance {
        let len = self.playlist.len();
        let Some(cur) = self.cursor else {
            return Advance::Stop;
        };

        if self.shuffle {
            if len <= 1 {
                return Advance::To(0);
            }
            let mut rng = rand::thread_rng();
            let mut pick = rng.gen_range(0..len - 1);
            if pick >= cur {
                pick += 1;
            }
            return Advance::To(pick);
        }

        if cur + 1 >= len {
            match self.repeat {
                RepeatMode::List => Advance::To(0),
                _ => Advance::Stop,
            }
        } else {
            Advance::To(cur + 1)
        }
    }

    /// Where would "previous" go? Past the rewind threshold it restarts the
    /// current track; otherwise it steps back with wraparound. Shuffle never
    /// applies here, so users can retrace what they just heard.
    pub fn previous_action(&self) -> Advance {
        let len = self.playlist.len();
        let Some(cur) = self.cursor else {
            return Advance::Stop;
        };

        if self.media.position() > REWIND_THRESHOLD {
            Advance::RestartCurrent
        } else {
            Advance::To((cur + len - 1) % len)
        }
    }

    // ==============
    //   Transport
    // ============

    pub fn next(&mut self) {
        match self.next_index() {
            Advance::To(i) => {
                self.cursor = Some(i);
                self.reload_current();
            }
            Advance::Stop => self.halt(),
            Advance::RestartCurrent => {}
        }
    }

    pub fn previous(&mut self) {
        match self.previous_action() {
            Advance::RestartCurrent => {
                if let Err(e) = self.media.seek(Duration::ZERO) {
                    warn!("restart seek failed: {e}");
                }
            }
            Advance::To(i) => {
                self.cursor = Some(i);
                self.reload_current();
            }
            Advance::Stop => {}
        }
    }

    /// End-of-track handler. Single-repeat restarts in place and keeps
    /// playing; everything else behaves like an automatic "next", halting
    /// when the list runs out.
    pub fn on_ended(&mut self) {
        if self.cursor.is_none() {
            return;
        }

        if self.repeat == RepeatMode::Single {
            match self.media.seek(Duration::ZERO) {
                Ok(()) => self.play(),
                Err(e) => {
                    warn!("single-repeat restart failed: {e}");
                    self.halt();
                }
            }
            return;
        }

        match self.next_index() {
            Advance::To(i) => {
                self.cursor = Some(i);
                self.reload_current();
            }
            Advance::Stop | Advance::RestartCurrent => self.halt(),
        }
    }

    /// Jump straight to a playlist entry (the playlist-view click).
    pub fn play_index(&mut self, index: usize) {
        if index < self.playlist.len() {
            self.cursor = Some(index);
            self.reload_current();
            self.play();
        }
    }

    /// Attempts to start the media source. The status only becomes
    /// `Playing` once the backend confirms; a refusal surfaces as an error
    /// event instead of an optimistic flag.
    pub fn play(&mut self) {
        if self.cursor.is_none() {
            return;
        }
        match self.media.play() {
            Ok(()) => {
                self.last_error = None;
                self.set_status(PlaybackStatus::Playing);
            }
            Err(e) => {
                warn!("playback refused: {e}");
                self.last_error = Some(e.to_string());
                self.emit(ControllerEvent::PlaybackError(e.to_string()));
            }
        }
    }

    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.media.pause();
            self.set_status(PlaybackStatus::Paused);
        }
    }

    pub fn toggle_play(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&mut self, position: Duration) {
        if self.cursor.is_some() {
            if let Err(e) = self.media.seek(position) {
                warn!("seek failed: {e}");
            }
        }
    }

    /// Poll hook: call this from the event loop so a drained track turns
    /// into an end-of-track transition.
    pub fn tick(&mut self) {
        if self.status == PlaybackStatus::Playing && self.media.is_finished() {
            debug!("track ended, advancing");
            self.on_ended();
        }
    }

    /// Loads the song under the cursor into the media source, resuming
    /// playback if something was playing before the switch.
    fn reload_current(&mut self) {
        let resume = self.status == PlaybackStatus::Playing;

        if let Some(song) = self.current_song() {
            let source = song.source.clone();
            if let Err(e) = self.media.load(&source) {
                warn!("failed to load track: {e}");
                self.last_error = Some(e.to_string());
                self.set_status(PlaybackStatus::Stopped);
                self.emit(ControllerEvent::PlaybackError(e.to_string()));
                let cursor = self.cursor;
                self.emit(ControllerEvent::SongChanged(cursor));
                return;
            }
        }

        let cursor = self.cursor;
        self.emit(ControllerEvent::SongChanged(cursor));
        if resume {
            // Status is already Playing; re-confirm with the new track.
            if let Err(e) = self.media.play() {
                warn!("playback refused after track switch: {e}");
                self.last_error = Some(e.to_string());
                self.set_status(PlaybackStatus::Stopped);
                self.emit(ControllerEvent::PlaybackError(e.to_string()));
            }
        }
    }

    /// Stop at the end of the list: park the cursor where it is, rewind to
    /// the start of the track and go quiet.
    fn halt(&mut self) {
        if let Err(e) = self.media.seek(Duration::ZERO) {
            debug!("rewind on halt failed: {e}");
        }
        self.media.pause();
        self.set_status(PlaybackStatus::Stopped);
    }

    // =====================
    //   Modes and volume
    // ===================

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycled();
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if !self.muted {
            self.media.set_volume(self.volume);
        }
    }

    /// Mute remembers the volume it silenced; unmute restores exactly that.
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.muted = false;
            self.volume = self.saved_volume;
            self.media.set_volume(self.volume);
        } else {
            self.saved_volume = self.volume;
            self.muted = true;
            self.media.set_volume(0.0);
        }
    }

    // ==========================
    //   Deferred metadata
    // ========================

    /// Applies a finished tag resolution. Results are keyed by song
    /// identity, so anything that raced with a removal is dropped here.
    pub fn apply_tags(&mut self, id: SongId, tags: TagInfo) {
        let Some(pos) = self.playlist.position_of(id) else {
            debug!("discarding tags for a song no longer in the playlist");
            return;
        };

        if let Some(song) = self.playlist.get_mut(pos) {
            if let Some(title) = tags.title {
                song.title = title;
            }
            if let Some(artist) = tags.artist {
                song.artist = artist;
            }
            if let Some(bytes) = tags.cover {
                song.cover = Some(crate::song::CoverArt::Embedded(bytes));
            }
            if tags.duration.is_some() {
                song.duration = tags.duration;
            }
        }

        if self.cursor == Some(pos) {
            let cursor = self.cursor;
            self.emit(ControllerEvent::SongChanged(cursor));
        }
    }

    /// Same identity rule for a resolved cover theme.
    pub fn apply_theme(&mut self, id: SongId, theme: Theme) {
        let Some(pos) = self.playlist.position_of(id) else {
            debug!("discarding theme for a song no longer in the playlist");
            return;
        };

        if let Some(song) = self.playlist.get_mut(pos) {
            song.theme = Some(theme);
        }

        if self.cursor == Some(pos) {
            let cursor = self.cursor;
            self.emit(ControllerEvent::SongChanged(cursor));
        }
    }

    // =============
    //   Queries
    // ===========

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.cursor.and_then(|i| self.playlist.get(i))
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn position(&self) -> Duration {
        self.media.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.media
            .duration()
            .or_else(|| self.current_song().and_then(|s| s.duration))
    }
}
