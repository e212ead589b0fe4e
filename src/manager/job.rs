use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::config::LibrarySettings;
use crate::error::Result;
use crate::library::{
    CancelToken, DirectoryScanner, LoftyExtractor, MetadataExtractor, Reconciler, Reconciliation,
    Track,
};

use super::access::RootGrant;

/// Claim on a manager's single scan slot. Released on commit or when the job
/// (or its outcome) is dropped uncommitted.
#[derive(Debug)]
pub(super) struct ScanSlot {
    pub(super) generation: u64,
    pub(super) in_flight: Arc<AtomicU64>,
}

impl ScanSlot {
    /// `None` while another generation holds the slot. Generation 0 means free.
    pub(super) fn claim(in_flight: &Arc<AtomicU64>, generation: u64) -> Option<Self> {
        in_flight
            .compare_exchange(0, generation, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(Self {
            generation,
            in_flight: Arc::clone(in_flight),
        })
    }

    pub(super) fn is_current(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == self.generation
    }
}

impl Drop for ScanSlot {
    fn drop(&mut self) {
        let released = self
            .in_flight
            .compare_exchange(self.generation, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if released {
            debug!(generation = self.generation, "scan slot released");
        }
    }
}

/// A reconciliation handed out by [`super::LibraryManager::begin_refresh`].
///
/// Owns everything it needs, so it can run on a worker thread while the
/// manager keeps serving reads. Only one job may be outstanding per manager;
/// dropping a job or its outcome without committing frees the manager again.
#[derive(Debug)]
pub struct ScanJob {
    pub(super) slot: ScanSlot,
    pub(super) existing: Vec<Track>,
    pub(super) grant: RootGrant,
    pub(super) settings: LibrarySettings,
    pub(super) cancel: CancelToken,
}

/// Result of running a [`ScanJob`], to be handed back to
/// [`super::LibraryManager::commit`].
#[derive(Debug)]
pub struct ScanOutcome {
    pub(super) slot: ScanSlot,
    pub(super) result: Result<Reconciliation>,
}

impl ScanOutcome {
    pub fn generation(&self) -> u64 {
        self.slot.generation
    }
}

impl ScanJob {
    /// Token that stops the job between files; a cancelled job commits nothing.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn generation(&self) -> u64 {
        self.slot.generation
    }

    /// Run with tag reading backed by `lofty`.
    pub fn run(self) -> ScanOutcome {
        self.run_with(&LoftyExtractor)
    }

    pub fn run_with<M: MetadataExtractor>(self, metadata: &M) -> ScanOutcome {
        let ScanJob {
            slot,
            existing,
            grant,
            settings,
            cancel,
        } = self;

        info!(
            generation = slot.generation,
            root = %grant.path().display(),
            "scanning music directory"
        );
        let scanner = DirectoryScanner::new(&settings);
        let result =
            Reconciler::new(&scanner, metadata).reconcile(&existing, grant.path(), &cancel);
        drop(grant);

        ScanOutcome { slot, result }
    }
}
