use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::library::{LoftyExtractor, MetadataExtractor, Track, TrackId};

use super::output::AudioOutput;
use super::types::{PlaybackInfo, PlaybackState};

/// Playback state machine over `Idle`, `Playing` and `Paused`, with shuffle
/// as an orthogonal flag.
///
/// Traversal follows the effective order: the shuffled order when shuffle is
/// on, else the source collection, else the whole library. The shuffled order
/// is a snapshot taken when shuffle is turned on or the source changes, so
/// library updates never reshuffle a traversal in progress.
pub struct Navigator<O> {
    output: O,
    rng: StdRng,
    metadata: Box<dyn MetadataExtractor>,
    artwork: Option<Arc<[u8]>>,
    library: Vec<Track>,
    source: Option<Vec<Track>>,
    shuffled: Option<Vec<Track>>,
    shuffle: bool,
    current: Option<Track>,
    state: PlaybackState,
}

impl<O: AudioOutput> Navigator<O> {
    pub fn new(output: O, library: Vec<Track>, shuffle: bool) -> Self {
        Self::with_rng(output, library, shuffle, StdRng::from_os_rng())
    }

    pub fn with_rng(output: O, library: Vec<Track>, shuffle: bool, rng: StdRng) -> Self {
        let mut navigator = Self {
            output,
            rng,
            metadata: Box::new(LoftyExtractor),
            artwork: None,
            library,
            source: None,
            shuffled: None,
            shuffle,
            current: None,
            state: PlaybackState::Idle,
        };
        if shuffle {
            navigator.reshuffle();
        }
        navigator
    }

    /// Read cover art for started tracks through `metadata` instead of `lofty`.
    pub fn with_metadata(mut self, metadata: impl MetadataExtractor + 'static) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    /// The collection `next`/`previous` walk through.
    pub fn effective_order(&self) -> &[Track] {
        if self.shuffle {
            if let Some(order) = &self.shuffled {
                return order;
            }
        }
        self.source.as_deref().unwrap_or(&self.library)
    }

    pub fn info(&self) -> PlaybackInfo {
        PlaybackInfo {
            state: self.state,
            current: self.current.clone(),
            shuffle: self.shuffle,
            elapsed: match self.state {
                PlaybackState::Idle => Duration::ZERO,
                _ => self.output.position(),
            },
            lyrics: self.current.as_ref().and_then(|t| t.lyrics.clone()),
            artwork: self.artwork.clone(),
        }
    }

    /// Replace the library used when no source collection is set. A non-empty
    /// shuffled order is kept as is.
    pub fn set_library(&mut self, tracks: Vec<Track>) {
        self.library = tracks;
        let no_order = self.shuffled.as_ref().is_none_or(Vec::is_empty);
        if self.shuffle && self.source.is_none() && no_order {
            self.reshuffle();
        }
    }

    pub fn set_source(&mut self, tracks: Vec<Track>) {
        debug!(tracks = tracks.len(), "playback source replaced");
        self.source = Some(tracks);
        if self.shuffle {
            self.reshuffle();
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        if self.shuffle {
            self.reshuffle();
        } else {
            self.shuffled = None;
        }
        info!(shuffle = self.shuffle, "shuffle toggled");
    }

    /// Start `id`, replacing the source collection first when one is given.
    /// The track is looked up in the effective order, then in the library.
    pub fn play(&mut self, id: TrackId, source: Option<Vec<Track>>) -> Result<()> {
        if let Some(tracks) = source {
            self.set_source(tracks);
        }
        let track = self
            .effective_order()
            .iter()
            .chain(&self.library)
            .find(|t| t.id == id)
            .cloned()
            .ok_or(Error::TrackNotFound(id))?;
        self.start(track)
    }

    pub fn pause(&mut self) {
        if self.current.is_some() && self.state == PlaybackState::Playing {
            self.output.pause();
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.current.is_some() && self.state == PlaybackState::Paused {
            self.output.resume();
            self.state = PlaybackState::Playing;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Idle => {}
        }
    }

    /// Play the following track. `Ok(false)` at the end of the order or when
    /// the current track is not part of it.
    pub fn next(&mut self) -> Result<bool> {
        let Some(index) = self.current_index() else {
            return Ok(false);
        };
        match self.effective_order().get(index + 1).cloned() {
            Some(track) => self.start(track).map(|()| true),
            None => Ok(false),
        }
    }

    /// Play the preceding track. `Ok(false)` at the start of the order or when
    /// the current track is not part of it.
    pub fn previous(&mut self) -> Result<bool> {
        let Some(index) = self.current_index() else {
            return Ok(false);
        };
        let Some(prev) = index.checked_sub(1) else {
            return Ok(false);
        };
        let track = self.effective_order()[prev].clone();
        self.start(track).map(|()| true)
    }

    /// Seek within the current track; positions outside `0..=duration` are
    /// ignored and return `Ok(false)`.
    pub fn seek(&mut self, seconds: f64) -> Result<bool> {
        if self.state == PlaybackState::Idle {
            return Ok(false);
        }
        let Some(track) = &self.current else {
            return Ok(false);
        };
        if !seconds.is_finite() || seconds < 0.0 || seconds > track.duration_seconds {
            debug!(seconds, duration = track.duration_seconds, "seek out of range");
            return Ok(false);
        }
        self.output.seek(Duration::from_secs_f64(seconds))?;
        Ok(true)
    }

    /// Natural end of the current track: advance, or go idle when there is no
    /// successor. The current track is kept so `previous` still works.
    pub fn on_finished(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        if !self.next()? {
            self.output.stop();
            self.state = PlaybackState::Idle;
            debug!("end of playback order");
        }
        Ok(())
    }

    /// True when the output reports the playing track has ended.
    pub fn poll_finished(&self) -> bool {
        self.state == PlaybackState::Playing && self.output.is_finished()
    }

    pub fn stop(&mut self) {
        self.output.stop();
        self.state = PlaybackState::Idle;
    }

    fn current_index(&self) -> Option<usize> {
        let id = self.current.as_ref()?.id;
        self.effective_order().iter().position(|t| t.id == id)
    }

    fn start(&mut self, track: Track) -> Result<()> {
        if let Err(err) = self.output.play(&track.path) {
            warn!(path = %track.path.display(), error = %err, "could not start track");
            self.state = PlaybackState::Idle;
            return Err(err);
        }
        info!(id = %track.id, title = %track.title, "now playing");
        self.artwork = self.metadata.read_artwork(&track.path).map(Arc::from);
        self.current = Some(track);
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn reshuffle(&mut self) {
        let mut order = self.source.as_ref().unwrap_or(&self.library).clone();
        order.shuffle(&mut self.rng);
        self.shuffled = Some(order);
    }
}
