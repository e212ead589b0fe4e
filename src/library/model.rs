use std::fmt;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::metadata::{TrackTags, fallback_title};

/// Stable track identity: a creation-time token (nanoseconds since the epoch)
/// minted once when a file is first discovered and never reassigned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(u64);

impl TrackId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrackId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Hands out strictly increasing [`TrackId`]s.
///
/// Each id is the current wall-clock time in nanoseconds, bumped past the
/// last id seen so that ordering by id is ordering by creation even when the
/// clock stalls or goes backwards.
#[derive(Debug, Clone)]
pub struct IdMinter {
    last: u64,
}

impl IdMinter {
    /// A minter whose ids sort after every id in `existing`.
    pub fn after<'a>(existing: impl IntoIterator<Item = &'a Track>) -> Self {
        let last = existing
            .into_iter()
            .map(|t| t.id.as_raw())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    pub fn mint(&mut self) -> TrackId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
        self.last = now.max(self.last.saturating_add(1));
        TrackId(self.last)
    }
}

/// Lowercase hex SHA-256 digest of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A track in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub content_hash: ContentHash,
    /// 1-based position in the library; recomputed on every reconciliation and removal.
    pub track_number: usize,
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_seconds: f64,
    pub lyrics: Option<String>,
}

impl Track {
    /// Build a track from freshly read tags. `track_number` is left at 0 until
    /// the library is renumbered.
    pub fn from_tags(
        id: TrackId,
        content_hash: ContentHash,
        path: PathBuf,
        tags: TrackTags,
    ) -> Self {
        let title = tags.title.unwrap_or_else(|| fallback_title(&path));
        Self {
            id,
            content_hash,
            track_number: 0,
            path,
            title,
            artist: tags.artist,
            album: tags.album,
            duration_seconds: tags.duration_seconds,
            lyrics: tags.lyrics,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_seconds).unwrap_or(Duration::ZERO)
    }
}

/// Assign `track_number = 1..=N` following the current order.
pub fn renumber(tracks: &mut [Track]) {
    for (i, track) in tracks.iter_mut().enumerate() {
        track.track_number = i + 1;
    }
}
