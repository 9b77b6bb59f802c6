use crate::error::PlayerError;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::tag::Accessor;
use std::path::Path;
use std::time::Duration;

/// What tag extraction managed to recover. Every field is optional; the
/// song keeps its filename title and placeholder artist for anything
/// missing.
#[derive(Debug, Clone, Default)]
pub struct TagInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub cover: Option<Vec<u8>>,
    pub duration: Option<Duration>,
}

/// Read title/artist/cover/duration from an audio file's tags.
pub fn read_tags(path: &Path) -> Result<TagInfo, PlayerError> {
    let tagged_file =
        lofty::read_from_path(path).map_err(|e| PlayerError::TagRead(e.to_string()))?;

    let mut info = TagInfo {
        duration: Some(tagged_file.properties().duration()),
        ..TagInfo::default()
    };

    for tag in tagged_file.tags() {
        if info.title.is_none() {
            info.title = tag.title().map(|t| t.to_string());
        }
        if info.artist.is_none() {
            info.artist = tag.artist().map(|a| a.to_string());
        }
        if info.cover.is_none() {
            for picture in tag.pictures() {
                if picture.pic_type() == PictureType::CoverFront
                    || picture.pic_type() == PictureType::Other
                {
                    info.cover = Some(picture.data().to_vec());
                    break;
                }
            }
        }
    }

    Ok(info)
}
