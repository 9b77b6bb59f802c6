pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod media;
pub mod playlist;
pub mod presets;
pub mod song;
pub mod tags;
pub mod theme;

pub use controller::{Advance, ControllerEvent, PlaybackController, PlaybackStatus, RepeatMode};
pub use media::{MediaSource, SilentMedia};
pub use song::{Song, SongId, SongSource};
