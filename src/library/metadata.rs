use std::borrow::Cow;
use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::{Accessor, ItemKey};
use tracing::debug;

/// Tags read from an audio file. Every field may be missing; a file whose tags
/// cannot be read at all yields `TrackTags::default()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_seconds: f64,
    pub lyrics: Option<String>,
}

/// Reads descriptive metadata for a file. Implementations never fail: they
/// degrade to absent fields.
pub trait MetadataExtractor {
    fn read_tags(&self, path: &Path) -> TrackTags;

    /// Bytes of the first embedded picture. Only read for the track being
    /// played, never during scans.
    fn read_artwork(&self, _path: &Path) -> Option<Vec<u8>> {
        None
    }
}

/// [`MetadataExtractor`] backed by `lofty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyExtractor;

impl MetadataExtractor for LoftyExtractor {
    fn read_tags(&self, path: &Path) -> TrackTags {
        let tagged = match lofty::read_from_path(path) {
            Ok(tagged) => tagged,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no readable tags");
                return TrackTags::default();
            }
        };

        let mut tags = TrackTags {
            duration_seconds: tagged.properties().duration().as_secs_f64(),
            ..TrackTags::default()
        };

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            tags.title = tag.title().and_then(non_empty);
            tags.artist = tag.artist().and_then(non_empty);
            tags.album = tag.album().and_then(non_empty);
            tags.lyrics = tag
                .get_string(&ItemKey::Lyrics)
                .and_then(|v| non_empty(Cow::Borrowed(v)));
        }

        tags
    }

    fn read_artwork(&self, path: &Path) -> Option<Vec<u8>> {
        let tagged = match lofty::read_from_path(path) {
            Ok(tagged) => tagged,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no readable artwork");
                return None;
            }
        };
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
        tag.pictures().first().map(|p| p.data().to_vec())
    }
}

fn non_empty(value: Cow<'_, str>) -> Option<String> {
    let v = value.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

/// Title used when a file carries no title tag: its file stem.
pub fn fallback_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string()
}
