use crate::error::PlayerError;
use crate::song::{CoverArt, Song, SongSource};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac"];

/// One record in the bundled preset list.
#[derive(Debug, Deserialize)]
struct PresetRecord {
    title: String,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    src: String,
}

/// Parse a raw preset list (a JSON array of song records).
pub fn parse_presets(raw: &str) -> Result<Vec<Song>, PlayerError> {
    let records: Vec<PresetRecord> = serde_json::from_str(raw)?;

    Ok(records
        .into_iter()
        .map(|r| {
            let mut song = Song::new(
                r.title,
                r.artist.unwrap_or_else(|| "Unknown Artist".to_string()),
                SongSource::from_ref(&r.src),
            );
            song.cover = r.cover.map(CoverArt::Reference);
            song
        })
        .collect())
}

/// Load the preset list from disk. A missing or malformed file is an empty
/// playlist, never an error.
pub fn load_presets(path: &Path) -> Vec<Song> {
    match fs::read_to_string(path) {
        Ok(raw) => match parse_presets(&raw) {
            Ok(songs) => songs,
            Err(e) => {
                warn!("ignoring malformed preset list {}: {e}", path.display());
                Vec::new()
            }
        },
        Err(e) => {
            warn!("preset list {} unavailable: {e}", path.display());
            Vec::new()
        }
    }
}

/// Sweep a directory for audio files, in path order so runs are stable.
pub fn scan_directory(dir: &Path) -> Vec<Song> {
    let mut songs: Vec<Song> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|entry| Song::from_file(entry.path()))
        .collect();

    songs.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    songs
}
