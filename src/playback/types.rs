//! Commands, state and the shared playback handle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::library::{Track, TrackId};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

#[derive(Debug)]
pub enum PlayerCmd {
    /// Play a track, optionally replacing the source collection first.
    Play {
        track: TrackId,
        source: Option<Vec<Track>>,
    },
    /// Replace the source collection (a playlist or a filtered view).
    SetSource(Vec<Track>),
    /// A new library snapshot was published.
    SetLibrary(Vec<Track>),
    ToggleShuffle,
    Pause,
    Resume,
    TogglePause,
    Next,
    Prev,
    /// Seek to an absolute position in seconds.
    Seek(f64),
    /// The current track reached its natural end.
    TrackFinished,
    Quit,
}

/// Runtime playback information shared with the front end.
#[derive(Debug, Clone, Default)]
pub struct PlaybackInfo {
    pub state: PlaybackState,
    pub current: Option<Track>,
    pub shuffle: bool,
    /// Elapsed playback time for the current track.
    pub elapsed: Duration,
    pub lyrics: Option<String>,
    /// Embedded cover picture of the current track, as stored in the file.
    pub artwork: Option<Arc<[u8]>>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
