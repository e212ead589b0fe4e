use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::config::LibrarySettings;
use crate::error::{Error, Result};
use crate::library::{
    CancelToken, LoftyExtractor, MetadataExtractor, ScanReport, Track, TrackId, filter_tracks,
    renumber,
};
use crate::playlist::{Playlist, PlaylistId, PlaylistStore};
use crate::storage::{LibraryStore, STORAGE_VERSION, StoredLibrary};

use super::access::RootGrant;
use super::job::{ScanJob, ScanOutcome, ScanSlot};

/// Immutable view of library and playlist state, published after every
/// completed mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibrarySnapshot {
    /// Increments on every published change.
    pub revision: u64,
    pub root: Option<PathBuf>,
    pub tracks: Vec<Track>,
    pub playlists: Vec<Playlist>,
}

impl LibrarySnapshot {
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }
}

pub struct LibraryManager<S> {
    pub(super) store: S,
    settings: LibrarySettings,
    root: Option<PathBuf>,
    tracks: Vec<Track>,
    playlists: PlaylistStore,
    snapshot: Arc<LibrarySnapshot>,
    pub(super) subscribers: Vec<Sender<Arc<LibrarySnapshot>>>,
    scan_generation: u64,
    /// Generation of the outstanding job, 0 when idle.
    pub(super) in_flight: Arc<AtomicU64>,
}

impl<S: LibraryStore> LibraryManager<S> {
    /// Load persisted state from `store` (or start empty when nothing is saved).
    pub fn open(store: S, settings: LibrarySettings) -> Result<Self> {
        let stored = store.load()?.unwrap_or_default();
        if stored.version != STORAGE_VERSION {
            warn!(
                found = stored.version,
                expected = STORAGE_VERSION,
                "library file version differs; loading anyway"
            );
        }

        let mut tracks = stored.tracks;
        tracks.sort_by_key(|t| t.id);
        renumber(&mut tracks);

        let mut manager = Self {
            store,
            settings,
            root: stored.root,
            tracks,
            playlists: PlaylistStore::from_playlists(stored.playlists),
            snapshot: Arc::new(LibrarySnapshot::default()),
            subscribers: Vec::new(),
            scan_generation: 0,
            in_flight: Arc::new(AtomicU64::new(0)),
        };
        // Heal references that may dangle in a hand-edited file.
        let ids = manager.track_ids();
        manager.playlists.prune(&ids);
        manager.snapshot = Arc::new(manager.build_snapshot(0));

        info!(
            tracks = manager.tracks.len(),
            playlists = manager.playlists.playlists().len(),
            "library opened"
        );
        Ok(manager)
    }

    pub fn snapshot(&self) -> Arc<LibrarySnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&mut self) -> Receiver<Arc<LibrarySnapshot>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn playlists(&self) -> &[Playlist] {
        self.playlists.playlists()
    }

    pub fn playlist(&self, id: PlaylistId) -> Result<&Playlist> {
        self.playlists.get(id)
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn is_scanning(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) != 0
    }

    /// The filtered view: tracks whose title, artist or album contain `query`.
    pub fn search(&self, query: &str) -> Vec<Track> {
        filter_tracks(&self.tracks, query)
    }

    /// Tracks of a playlist in position order.
    pub fn playlist_tracks(&self, id: PlaylistId) -> Result<Vec<Track>> {
        let playlist = self.playlists.get(id)?;
        let by_id: HashMap<TrackId, &Track> = self.tracks.iter().map(|t| (t.id, t)).collect();
        Ok(playlist
            .track_ids()
            .filter_map(|tid| by_id.get(&tid).map(|t| (*t).clone()))
            .collect())
    }

    /// Record a new music directory, persist it, then reconcile against it.
    /// Rejected without touching the current root while a job is outstanding.
    pub fn select_root(&mut self, path: impl Into<PathBuf>) -> Result<ScanReport> {
        if self.is_scanning() {
            return Err(Error::ScanInProgress);
        }
        let path = path.into();
        RootGrant::acquire(&path)?;
        info!(root = %path.display(), "music directory selected");
        self.root = Some(path);
        self.commit_change()?;
        self.refresh()
    }

    /// Start a reconciliation. Fails with [`Error::ScanInProgress`] while a
    /// previous job is neither committed nor dropped, and with
    /// [`Error::NoDirectorySelected`] when there is no usable root.
    pub fn begin_refresh(&mut self) -> Result<ScanJob> {
        if self.is_scanning() {
            return Err(Error::ScanInProgress);
        }
        let root = self.root.as_deref().ok_or(Error::NoDirectorySelected)?;
        let grant = RootGrant::acquire(root)?;

        let generation = self.scan_generation + 1;
        let slot = ScanSlot::claim(&self.in_flight, generation).ok_or(Error::ScanInProgress)?;
        self.scan_generation = generation;

        Ok(ScanJob {
            slot,
            existing: self.tracks.clone(),
            grant,
            settings: self.settings.clone(),
            cancel: CancelToken::new(),
        })
    }

    /// Apply a finished job. Cancelled or failed jobs leave the library as it was.
    pub fn commit(&mut self, outcome: ScanOutcome) -> Result<ScanReport> {
        let ScanOutcome { slot, result } = outcome;
        if !slot.is_current() {
            return Err(Error::StaleScan);
        }
        drop(slot);

        let reconciliation = result?;
        let report = reconciliation.report;
        if report.cancelled {
            return Ok(report);
        }

        self.tracks = reconciliation.tracks;
        let ids = self.track_ids();
        let pruned = self.playlists.prune(&ids);
        if pruned > 0 {
            info!(pruned, "removed playlist entries for missing tracks");
        }

        self.commit_change()?;
        Ok(report)
    }

    /// Synchronous begin, run and commit using `lofty` for tags.
    pub fn refresh(&mut self) -> Result<ScanReport> {
        self.refresh_with(&LoftyExtractor)
    }

    pub fn refresh_with<M: MetadataExtractor>(&mut self, metadata: &M) -> Result<ScanReport> {
        let job = self.begin_refresh()?;
        let outcome = job.run_with(metadata);
        self.commit(outcome)
    }

    /// Remove a track from the library and from every playlist.
    pub fn remove_track(&mut self, id: TrackId) -> Result<()> {
        let index = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TrackNotFound(id))?;
        let removed = self.tracks.remove(index);
        renumber(&mut self.tracks);

        let ids = self.track_ids();
        self.playlists.prune(&ids);
        info!(id = %id, title = %removed.title, "track removed");

        self.commit_change()
    }

    pub fn create_playlist(&mut self, name: impl Into<String>) -> Result<Playlist> {
        let playlist = self.playlists.create(name);
        debug!(playlist = %playlist.id, name = %playlist.name, "playlist created");
        self.commit_change()?;
        Ok(playlist)
    }

    pub fn delete_playlist(&mut self, id: PlaylistId) -> Result<()> {
        let playlist = self.playlists.delete(id)?;
        debug!(playlist = %id, name = %playlist.name, "playlist deleted");
        self.commit_change()
    }

    /// Append library tracks to a playlist. Ids not in the library are skipped.
    pub fn add_tracks(&mut self, id: PlaylistId, track_ids: &[TrackId]) -> Result<usize> {
        self.playlists.get(id)?;
        let known: Vec<TrackId> = track_ids
            .iter()
            .copied()
            .filter(|tid| {
                let present = self.track(*tid).is_some();
                if !present {
                    warn!(track = %tid, "not adding unknown track to playlist");
                }
                present
            })
            .collect();

        let added = self.playlists.add_tracks(id, &known)?;
        self.commit_change()?;
        Ok(added)
    }

    pub fn remove_tracks(&mut self, id: PlaylistId, track_ids: &[TrackId]) -> Result<usize> {
        let removed = self.playlists.remove_tracks(id, track_ids)?;
        self.commit_change()?;
        Ok(removed)
    }

    /// Move a playlist entry; out-of-range indices are ignored and return `Ok(false)`.
    pub fn reorder_playlist(&mut self, id: PlaylistId, from: usize, to: usize) -> Result<bool> {
        let moved = self.playlists.reorder(id, from, to)?;
        self.commit_change()?;
        Ok(moved)
    }

    fn track_ids(&self) -> HashSet<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    fn build_snapshot(&self, revision: u64) -> LibrarySnapshot {
        LibrarySnapshot {
            revision,
            root: self.root.clone(),
            tracks: self.tracks.clone(),
            playlists: self.playlists.playlists().to_vec(),
        }
    }

    /// Publish the new state, then persist it. A persistence failure is
    /// returned but the in-memory state stays as published.
    fn commit_change(&mut self) -> Result<()> {
        self.publish();
        self.persist()
    }

    fn publish(&mut self) {
        let snapshot = Arc::new(self.build_snapshot(self.snapshot.revision + 1));
        self.snapshot = Arc::clone(&snapshot);
        self.subscribers
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
    }

    fn persist(&self) -> Result<()> {
        let stored = StoredLibrary {
            version: STORAGE_VERSION,
            root: self.root.clone(),
            tracks: self.tracks.clone(),
            playlists: self.playlists.playlists().to_vec(),
        };
        self.store.save(&stored).inspect_err(|err| {
            warn!(error = %err, "failed to persist library; keeping in-memory state");
        })
    }
}
