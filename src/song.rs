use crate::theme::Theme;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_SONG_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for one song. Asynchronous tag/theme resolutions
/// are keyed by this (not by playlist index), so a result that arrives after
/// the song was removed can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SongId(u64);

impl SongId {
    pub fn next() -> Self {
        SongId(NEXT_SONG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where the playable bytes live.
#[derive(Debug, Clone, PartialEq)]
pub enum SongSource {
    File(PathBuf),
    Remote(String),
}

impl SongSource {
    /// Preset lists may reference either local paths or URLs.
    pub fn from_ref(reference: &str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            SongSource::Remote(reference.to_string())
        } else {
            SongSource::File(PathBuf::from(reference))
        }
    }
}

/// Cover art, either embedded tag bytes or a reference to an image file/URL.
#[derive(Debug, Clone)]
pub enum CoverArt {
    Embedded(Vec<u8>),
    Reference(String),
}

#[derive(Debug, Clone)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub cover: Option<CoverArt>,
    pub source: SongSource,
    /// Lazily extracted from the cover; cached once computed.
    pub theme: Option<Theme>,
    pub duration: Option<Duration>,
}

impl Song {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, source: SongSource) -> Self {
        Self {
            id: SongId::next(),
            title: title.into(),
            artist: artist.into(),
            cover: None,
            source,
            theme: None,
            duration: None,
        }
    }

    /// A song straight from a local file: filename stem as the title until
    /// tag extraction fills in something better.
    pub fn from_file(path: &Path) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self::new(title, "Unknown Artist", SongSource::File(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_ids_are_unique() {
        let a = Song::from_file(Path::new("/tmp/a.mp3"));
        let b = Song::from_file(Path::new("/tmp/a.mp3"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_from_file_uses_stem_as_title() {
        let song = Song::from_file(Path::new("/music/Echoes.flac"));
        assert_eq!(song.title, "Echoes");
        assert_eq!(song.artist, "Unknown Artist");
    }

    #[test]
    fn test_source_from_ref() {
        assert_eq!(
            SongSource::from_ref("https://cdn.example.com/a.mp3"),
            SongSource::Remote("https://cdn.example.com/a.mp3".to_string())
        );
        assert_eq!(
            SongSource::from_ref("media/a.mp3"),
            SongSource::File(PathBuf::from("media/a.mp3"))
        );
    }
}
