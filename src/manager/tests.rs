use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tempfile::{TempDir, tempdir};

use super::job::ScanSlot;
use super::*;
use crate::config::LibrarySettings;
use crate::error::{Error, Result};
use crate::library::{MetadataExtractor, Reconciliation, ScanReport, Track, TrackId, TrackTags};
use crate::storage::{JsonLibraryStore, LibraryStore, StoredLibrary};

/// Keeps the last saved library in memory and can be told to fail.
#[derive(Default)]
struct MemoryStore {
    saved: RefCell<Option<StoredLibrary>>,
    saves: Cell<usize>,
    fail: Cell<bool>,
}

impl LibraryStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredLibrary>> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, library: &StoredLibrary) -> Result<()> {
        if self.fail.get() {
            return Err(Error::FileSystem {
                path: PathBuf::from("/dev/full"),
                message: "disk full".into(),
            });
        }
        self.saves.set(self.saves.get() + 1);
        *self.saved.borrow_mut() = Some(library.clone());
        Ok(())
    }
}

/// Title is the file stem in upper case; no audio decoding needed.
struct StemTitle;

impl MetadataExtractor for StemTitle {
    fn read_tags(&self, path: &Path) -> TrackTags {
        TrackTags {
            title: path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_uppercase),
            duration_seconds: 120.0,
            ..TrackTags::default()
        }
    }
}

fn settings() -> LibrarySettings {
    LibrarySettings {
        extensions: vec!["mp3".into()],
        ..LibrarySettings::default()
    }
}

fn music_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn manager_at(root: &Path) -> LibraryManager<MemoryStore> {
    let store = MemoryStore::default();
    *store.saved.borrow_mut() = Some(StoredLibrary {
        root: Some(root.to_path_buf()),
        ..StoredLibrary::default()
    });
    LibraryManager::open(store, settings()).unwrap()
}

fn id_of(manager: &LibraryManager<MemoryStore>, title: &str) -> TrackId {
    manager
        .tracks()
        .iter()
        .find(|t| t.title == title)
        .map(|t| t.id)
        .unwrap_or_else(|| panic!("no track titled {title}"))
}

fn titles(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.title.as_str()).collect()
}

#[test]
fn deleted_file_is_pruned_and_survivors_keep_ids() {
    let dir = music_dir(&[("a.mp3", "aaa"), ("b.mp3", "bbb"), ("c.mp3", "ccc")]);
    let mut manager = manager_at(dir.path());
    manager.refresh_with(&StemTitle).unwrap();

    let (a, b, c) = (id_of(&manager, "A"), id_of(&manager, "B"), id_of(&manager, "C"));
    let pid = manager.create_playlist("Mix").unwrap().id;
    manager.add_tracks(pid, &[a, c]).unwrap();

    fs::remove_file(dir.path().join("a.mp3")).unwrap();
    let report = manager.refresh_with(&StemTitle).unwrap();

    assert_eq!(report.dropped, 1);
    assert_eq!(titles(manager.tracks()), vec!["B", "C"]);
    assert_eq!(id_of(&manager, "B"), b);
    assert_eq!(id_of(&manager, "C"), c);
    let numbers: Vec<usize> = manager.tracks().iter().map(|t| t.track_number).collect();
    assert_eq!(numbers, vec![1, 2]);

    let playlist = manager.playlist(pid).unwrap();
    assert_eq!(playlist.track_ids().collect::<Vec<_>>(), vec![c]);
    assert_eq!(playlist.entries[0].position, 1);
}

#[test]
fn select_root_records_directory_and_scans() {
    let dir = music_dir(&[("one.mp3", "1"), ("two.mp3", "2")]);
    let mut manager = LibraryManager::open(MemoryStore::default(), settings()).unwrap();

    let report = manager.select_root(dir.path()).unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(manager.root(), Some(dir.path()));
    let saved = manager.store.saved.borrow().clone().unwrap();
    assert_eq!(saved.root.as_deref(), Some(dir.path()));
    assert_eq!(saved.tracks.len(), 2);
}

#[test]
fn refresh_without_root_fails_and_leaves_state() {
    let mut manager = LibraryManager::open(MemoryStore::default(), settings()).unwrap();
    let before = manager.snapshot();

    assert!(matches!(
        manager.refresh_with(&StemTitle),
        Err(Error::NoDirectorySelected)
    ));
    assert_eq!(*manager.snapshot(), *before);
    assert_eq!(manager.store.saves.get(), 0);
}

#[test]
fn stale_root_grant_fails_and_keeps_library() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let root = dir.path().to_path_buf();
    let mut manager = manager_at(&root);
    manager.refresh_with(&StemTitle).unwrap();
    let saves = manager.store.saves.get();

    drop(dir);
    assert!(matches!(
        manager.refresh_with(&StemTitle),
        Err(Error::NoDirectorySelected)
    ));
    assert_eq!(titles(manager.tracks()), vec!["A"]);
    assert_eq!(manager.store.saves.get(), saves);
    assert!(!manager.is_scanning());
}

#[test]
fn second_begin_while_outstanding_is_rejected() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());

    let job = manager.begin_refresh().unwrap();
    assert!(matches!(manager.begin_refresh(), Err(Error::ScanInProgress)));

    manager.commit(job.run_with(&StemTitle)).unwrap();
    assert!(manager.begin_refresh().is_ok());
}

fn empty_outcome(manager: &LibraryManager<MemoryStore>, generation: u64) -> ScanOutcome {
    ScanOutcome {
        slot: ScanSlot {
            generation,
            in_flight: Arc::clone(&manager.in_flight),
        },
        result: Ok(Reconciliation {
            tracks: Vec::new(),
            report: ScanReport::default(),
        }),
    }
}

#[test]
fn outcome_from_another_generation_is_stale() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());
    manager.refresh_with(&StemTitle).unwrap();

    let job = manager.begin_refresh().unwrap();
    let generation = job.generation();
    assert!(matches!(
        manager.commit(empty_outcome(&manager, generation + 1)),
        Err(Error::StaleScan)
    ));
    assert!(manager.is_scanning());

    manager.commit(job.run_with(&StemTitle)).unwrap();
    // Replaying an already committed generation is stale too.
    assert!(matches!(
        manager.commit(empty_outcome(&manager, generation)),
        Err(Error::StaleScan)
    ));
    assert_eq!(titles(manager.tracks()), vec!["A"]);
}

#[test]
fn dropped_job_frees_the_scan_slot() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());

    let job = manager.begin_refresh().unwrap();
    drop(job);
    assert!(!manager.is_scanning());

    let outcome = manager.begin_refresh().unwrap().run_with(&StemTitle);
    drop(outcome);
    assert!(!manager.is_scanning());

    manager.refresh_with(&StemTitle).unwrap();
    assert_eq!(titles(manager.tracks()), vec!["A"]);
}

#[test]
fn dropping_a_stale_outcome_keeps_the_current_job() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());

    let job = manager.begin_refresh().unwrap();
    drop(empty_outcome(&manager, job.generation() + 1));

    assert!(manager.is_scanning());
    assert!(matches!(manager.begin_refresh(), Err(Error::ScanInProgress)));
    manager.commit(job.run_with(&StemTitle)).unwrap();
}

#[test]
fn select_root_during_scan_keeps_previous_root() {
    let old = music_dir(&[("old.mp3", "old")]);
    let new = music_dir(&[("new.mp3", "new")]);
    let mut manager = manager_at(old.path());

    let job = manager.begin_refresh().unwrap();
    assert!(matches!(
        manager.select_root(new.path()),
        Err(Error::ScanInProgress)
    ));
    assert_eq!(manager.root(), Some(old.path()));
    assert_eq!(manager.store.saves.get(), 0);

    manager.commit(job.run_with(&StemTitle)).unwrap();
    assert_eq!(manager.root(), Some(old.path()));
    assert_eq!(titles(manager.tracks()), vec!["OLD"]);
    let saved = manager.store.saved.borrow().clone().unwrap();
    assert_eq!(saved.root.as_deref(), Some(old.path()));

    manager.select_root(new.path()).unwrap();
    assert_eq!(titles(manager.tracks()), vec!["NEW"]);
}

#[test]
fn cancelled_job_commits_nothing() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());
    manager.refresh_with(&StemTitle).unwrap();
    let before = manager.snapshot();

    fs::write(dir.path().join("b.mp3"), "bbb").unwrap();
    let job = manager.begin_refresh().unwrap();
    job.cancel_token().cancel();
    let report = manager.commit(job.run_with(&StemTitle)).unwrap();

    assert!(report.cancelled);
    assert_eq!(*manager.snapshot(), *before);
    assert!(!manager.is_scanning());
}

#[test]
fn job_runs_on_a_worker_thread() {
    let dir = music_dir(&[("a.mp3", "aaa"), ("b.mp3", "bbb")]);
    let mut manager = manager_at(dir.path());

    let job = manager.begin_refresh().unwrap();
    // Reads keep working while the job is out.
    assert!(manager.tracks().is_empty());
    let outcome = thread::spawn(move || job.run_with(&StemTitle)).join().unwrap();
    let report = manager.commit(outcome).unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(titles(manager.tracks()), vec!["A", "B"]);
}

#[test]
fn subscribers_receive_each_published_snapshot() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());
    let rx = manager.subscribe();

    manager.refresh_with(&StemTitle).unwrap();
    let pid = manager.create_playlist("Later").unwrap().id;

    let first = rx.try_recv().unwrap();
    assert_eq!(titles(&first.tracks), vec!["A"]);
    assert!(first.playlists.is_empty());

    let second = rx.try_recv().unwrap();
    assert_eq!(second.revision, first.revision + 1);
    assert_eq!(second.playlists[0].id, pid);
    assert!(rx.try_recv().is_err());
}

#[test]
fn dropped_subscriber_does_not_block_publishing() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());
    drop(manager.subscribe());

    manager.refresh_with(&StemTitle).unwrap();
    assert!(manager.subscribers.is_empty());
}

#[test]
fn persistence_failure_keeps_in_memory_state() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());
    manager.store.fail.set(true);

    assert!(matches!(
        manager.refresh_with(&StemTitle),
        Err(Error::FileSystem { .. })
    ));
    assert_eq!(titles(manager.tracks()), vec!["A"]);
    assert_eq!(titles(&manager.snapshot().tracks), vec!["A"]);
    assert!(!manager.is_scanning());
}

#[test]
fn remove_track_renumbers_and_prunes_playlists() {
    let dir = music_dir(&[("a.mp3", "aaa"), ("b.mp3", "bbb")]);
    let mut manager = manager_at(dir.path());
    manager.refresh_with(&StemTitle).unwrap();
    let (a, b) = (id_of(&manager, "A"), id_of(&manager, "B"));
    let pid = manager.create_playlist("Both").unwrap().id;
    manager.add_tracks(pid, &[a, b]).unwrap();

    manager.remove_track(a).unwrap();

    assert_eq!(titles(manager.tracks()), vec!["B"]);
    assert_eq!(manager.tracks()[0].track_number, 1);
    let playlist = manager.playlist(pid).unwrap();
    assert_eq!(playlist.track_ids().collect::<Vec<_>>(), vec![b]);
    assert_eq!(playlist.entries[0].position, 1);
    assert!(matches!(
        manager.remove_track(a),
        Err(Error::TrackNotFound(id)) if id == a
    ));
}

#[test]
fn add_tracks_skips_ids_not_in_library() {
    let dir = music_dir(&[("a.mp3", "aaa")]);
    let mut manager = manager_at(dir.path());
    manager.refresh_with(&StemTitle).unwrap();
    let a = id_of(&manager, "A");
    let pid = manager.create_playlist("Mix").unwrap().id;

    let added = manager
        .add_tracks(pid, &[TrackId::from_raw(1), a])
        .unwrap();

    assert_eq!(added, 1);
    assert_eq!(titles(&manager.playlist_tracks(pid).unwrap()), vec!["A"]);
}

#[test]
fn playlist_tracks_follow_positions_after_reorder() {
    let dir = music_dir(&[("a.mp3", "aaa"), ("b.mp3", "bbb"), ("c.mp3", "ccc")]);
    let mut manager = manager_at(dir.path());
    manager.refresh_with(&StemTitle).unwrap();
    let ids: Vec<TrackId> = manager.tracks().iter().map(|t| t.id).collect();
    let pid = manager.create_playlist("Order").unwrap().id;
    manager.add_tracks(pid, &ids).unwrap();

    assert!(manager.reorder_playlist(pid, 2, 0).unwrap());
    assert!(!manager.reorder_playlist(pid, 5, 0).unwrap());

    assert_eq!(
        titles(&manager.playlist_tracks(pid).unwrap()),
        vec!["C", "A", "B"]
    );
    manager.remove_tracks(pid, &[ids[0]]).unwrap();
    assert_eq!(titles(&manager.playlist_tracks(pid).unwrap()), vec!["C", "B"]);

    manager.delete_playlist(pid).unwrap();
    assert!(matches!(
        manager.playlist_tracks(pid),
        Err(Error::PlaylistNotFound(_))
    ));
}

#[test]
fn search_filters_by_title() {
    let dir = music_dir(&[("alpha.mp3", "1"), ("beta.mp3", "2")]);
    let mut manager = manager_at(dir.path());
    manager.refresh_with(&StemTitle).unwrap();

    assert_eq!(titles(&manager.search("alp")), vec!["ALPHA"]);
    assert_eq!(manager.search("  ").len(), 2);
}

#[test]
fn open_restores_from_json_store() {
    let music = music_dir(&[("a.mp3", "aaa"), ("b.mp3", "bbb")]);
    let data = tempdir().unwrap();
    let path = data.path().join("library.json");

    let (ids, pid) = {
        let mut manager = LibraryManager::open(JsonLibraryStore::new(&path), settings()).unwrap();
        manager.select_root(music.path()).unwrap();
        let ids: Vec<TrackId> = manager.tracks().iter().map(|t| t.id).collect();
        let pid = manager.create_playlist("Kept").unwrap().id;
        manager.add_tracks(pid, &ids).unwrap();
        (ids, pid)
    };

    let reopened = LibraryManager::open(JsonLibraryStore::new(&path), settings()).unwrap();
    assert_eq!(reopened.root(), Some(music.path()));
    assert_eq!(
        reopened.tracks().iter().map(|t| t.id).collect::<Vec<_>>(),
        ids
    );
    assert_eq!(
        reopened.playlist(pid).unwrap().track_ids().collect::<Vec<_>>(),
        ids
    );
}
