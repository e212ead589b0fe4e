use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::library::TrackId;

use super::model::{Playlist, PlaylistEntry, PlaylistId};

/// In-memory playlist collection. Every mutation leaves each playlist's
/// positions contiguous from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistStore {
    playlists: Vec<Playlist>,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_playlists(mut playlists: Vec<Playlist>) -> Self {
        for p in &mut playlists {
            p.renumber();
        }
        Self { playlists }
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn get(&self, id: PlaylistId) -> Result<&Playlist> {
        self.playlists
            .iter()
            .find(|p| p.id == id)
            .ok_or(Error::PlaylistNotFound(id))
    }

    fn get_mut(&mut self, id: PlaylistId) -> Result<&mut Playlist> {
        self.playlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::PlaylistNotFound(id))
    }

    /// Append a new empty playlist. Names need not be unique.
    pub fn create(&mut self, name: impl Into<String>) -> Playlist {
        let playlist = Playlist::new(name);
        self.playlists.push(playlist.clone());
        playlist
    }

    pub fn delete(&mut self, id: PlaylistId) -> Result<Playlist> {
        let index = self
            .playlists
            .iter()
            .position(|p| p.id == id)
            .ok_or(Error::PlaylistNotFound(id))?;
        Ok(self.playlists.remove(index))
    }

    /// Append `track_ids` in the given order; returns how many were added.
    pub fn add_tracks(&mut self, id: PlaylistId, track_ids: &[TrackId]) -> Result<usize> {
        let playlist = self.get_mut(id)?;
        let start = playlist.entries.len();
        playlist
            .entries
            .extend(track_ids.iter().enumerate().map(|(i, &track_id)| PlaylistEntry {
                track_id,
                position: start + i + 1,
            }));
        Ok(track_ids.len())
    }

    /// Remove every entry whose track is in `track_ids`; returns how many were removed.
    pub fn remove_tracks(&mut self, id: PlaylistId, track_ids: &[TrackId]) -> Result<usize> {
        let playlist = self.get_mut(id)?;
        let doomed: HashSet<TrackId> = track_ids.iter().copied().collect();
        let before = playlist.entries.len();
        playlist.entries.retain(|e| !doomed.contains(&e.track_id));
        playlist.renumber();
        Ok(before - playlist.entries.len())
    }

    /// Move the entry at `from` to `to` (0-based). Out-of-range indices leave the
    /// playlist untouched and return `Ok(false)`.
    pub fn reorder(&mut self, id: PlaylistId, from: usize, to: usize) -> Result<bool> {
        let playlist = self.get_mut(id)?;
        let len = playlist.entries.len();
        if from >= len || to >= len {
            debug!(playlist = %id, from, to, len, "ignoring out-of-range reorder");
            return Ok(false);
        }

        let entry = playlist.entries.remove(from);
        playlist.entries.insert(to, entry);
        playlist.renumber();
        Ok(true)
    }

    /// Drop entries whose track is not in `library`, renumbering survivors.
    /// Returns the number of entries removed across all playlists.
    pub fn prune(&mut self, library: &HashSet<TrackId>) -> usize {
        let mut removed = 0;
        for playlist in &mut self.playlists {
            let before = playlist.entries.len();
            playlist.entries.retain(|e| library.contains(&e.track_id));
            if playlist.entries.len() != before {
                removed += before - playlist.entries.len();
                playlist.renumber();
            }
        }
        removed
    }
}
