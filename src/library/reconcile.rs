//! Reconciliation of a fresh directory scan against the persisted library.
//!
//! Identity resolution runs in three passes so that path matches always win
//! over content matches, regardless of the order files were discovered in:
//! 1. files whose path is already in the library keep that track's id;
//! 2. remaining files whose content hash is in the library adopt that id,
//!    unless pass 1 already claimed it;
//! 3. everything else gets a freshly minted id.
//!
//! When several files share one content hash, only one is kept: a path the
//! library already knows wins, otherwise the lexicographically first path.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::error::Result;

use super::hash::hash_file;
use super::metadata::MetadataExtractor;
use super::model::{ContentHash, IdMinter, Track, TrackId, renumber};
use super::scan::DirectoryScanner;

/// Counters describing one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Audio files that survived scanner filtering.
    pub candidates: usize,
    /// Files (or directory entries) that could not be read.
    pub unreadable: usize,
    /// Files skipped because another file in this scan has the same content.
    pub duplicates: usize,
    pub reused_by_path: usize,
    pub reused_by_hash: usize,
    pub added: usize,
    /// Tracks in the previous library that were not found again.
    pub dropped: usize,
    pub cancelled: bool,
}

/// Outcome of [`Reconciler::reconcile`]: the new library plus its report.
/// A cancelled run carries the existing library unchanged.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub tracks: Vec<Track>,
    pub report: ScanReport,
}

/// Shared flag checked between files; cancelling makes the run return the
/// existing library untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Reconciler<'a, M> {
    scanner: &'a DirectoryScanner,
    metadata: &'a M,
}

impl<'a, M: MetadataExtractor> Reconciler<'a, M> {
    pub fn new(scanner: &'a DirectoryScanner, metadata: &'a M) -> Self {
        Self { scanner, metadata }
    }

    /// Scan `root` and produce a new library that reuses ids from `existing`.
    ///
    /// Fails only when `root` cannot be listed; the caller decides whether to
    /// commit the returned library.
    pub fn reconcile(
        &self,
        existing: &[Track],
        root: &Path,
        cancel: &CancelToken,
    ) -> Result<Reconciliation> {
        let mut candidates = self.scanner.scan(root)?;
        let paths: Vec<PathBuf> = candidates.by_ref().collect();
        let walk_errors = candidates.walk_errors();
        drop(candidates);

        let mut reconciliation = self.reconcile_paths(existing, paths, cancel);
        let report = &mut reconciliation.report;
        report.unreadable += walk_errors;
        if !report.cancelled {
            info!(
                root = %root.display(),
                candidates = report.candidates,
                unreadable = report.unreadable,
                duplicates = report.duplicates,
                reused_by_path = report.reused_by_path,
                reused_by_hash = report.reused_by_hash,
                added = report.added,
                dropped = report.dropped,
                total = reconciliation.tracks.len(),
                "reconciliation complete"
            );
        }
        Ok(reconciliation)
    }

    /// Resolve identities for candidates that were already collected. A path
    /// that can no longer be read is counted as unreadable and skipped.
    pub fn reconcile_paths(
        &self,
        existing: &[Track],
        mut paths: Vec<PathBuf>,
        cancel: &CancelToken,
    ) -> Reconciliation {
        let mut report = ScanReport::default();

        // Enumeration order is filesystem dependent; sorting makes the
        // duplicate tie-break and new-id order reproducible. Known paths go
        // first so an added copy never displaces an existing track.
        let known: HashSet<&Path> = existing.iter().map(|t| t.path.as_path()).collect();
        paths.sort_by(|a, b| {
            let (a_new, b_new) = (!known.contains(a.as_path()), !known.contains(b.as_path()));
            a_new.cmp(&b_new).then_with(|| a.cmp(b))
        });
        report.candidates = paths.len();

        let mut claimed_hashes: HashMap<ContentHash, PathBuf> = HashMap::new();
        let mut discovered: Vec<(PathBuf, ContentHash)> = Vec::with_capacity(paths.len());

        for path in paths {
            if cancel.is_cancelled() {
                return cancelled(existing, report);
            }

            let hash = match hash_file(&path) {
                Ok(hash) => hash,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    report.unreadable += 1;
                    continue;
                }
            };

            if let Some(first) = claimed_hashes.get(&hash) {
                debug!(
                    path = %path.display(),
                    claimed_by = %first.display(),
                    hash = %hash,
                    "skipping duplicate content"
                );
                report.duplicates += 1;
                continue;
            }
            claimed_hashes.insert(hash.clone(), path.clone());
            discovered.push((path, hash));
        }

        let by_path: HashMap<&Path, TrackId> =
            existing.iter().map(|t| (t.path.as_path(), t.id)).collect();
        let by_hash: HashMap<&ContentHash, TrackId> =
            existing.iter().map(|t| (&t.content_hash, t.id)).collect();

        let mut ids: Vec<Option<TrackId>> = vec![None; discovered.len()];
        let mut claimed_ids: HashSet<TrackId> = HashSet::new();

        for (slot, (path, _)) in ids.iter_mut().zip(&discovered) {
            if let Some(&id) = by_path.get(path.as_path()) {
                if claimed_ids.insert(id) {
                    *slot = Some(id);
                    report.reused_by_path += 1;
                }
            }
        }

        for (slot, (path, hash)) in ids.iter_mut().zip(&discovered) {
            if slot.is_some() {
                continue;
            }
            if let Some(&id) = by_hash.get(hash) {
                if claimed_ids.insert(id) {
                    debug!(path = %path.display(), id = %id, "identity follows moved content");
                    *slot = Some(id);
                    report.reused_by_hash += 1;
                }
            }
        }

        let mut minter = IdMinter::after(existing);
        let mut tracks = Vec::with_capacity(discovered.len());
        for (slot, (path, hash)) in ids.into_iter().zip(discovered) {
            if cancel.is_cancelled() {
                return cancelled(existing, report);
            }

            let id = match slot {
                Some(id) => id,
                None => {
                    report.added += 1;
                    minter.mint()
                }
            };
            let tags = self.metadata.read_tags(&path);
            tracks.push(Track::from_tags(id, hash, path, tags));
        }

        tracks.sort_by_key(|t| t.id);
        renumber(&mut tracks);

        report.dropped = existing
            .len()
            .saturating_sub(report.reused_by_path + report.reused_by_hash);

        Reconciliation { tracks, report }
    }
}

fn cancelled(existing: &[Track], mut report: ScanReport) -> Reconciliation {
    info!("reconciliation cancelled; keeping existing library");
    report.cancelled = true;
    Reconciliation {
        tracks: existing.to_vec(),
        report,
    }
}
