//! Library manager: the single owner of library and playlist state.
//!
//! The manager applies reconciliation results, playlist edits and track
//! removals, then publishes an immutable [`LibrarySnapshot`] to subscribers
//! and persists through a [`crate::storage::LibraryStore`].

mod access;
mod job;
mod model;

pub use access::RootGrant;
pub use job::{ScanJob, ScanOutcome};
pub use model::{LibraryManager, LibrarySnapshot};

#[cfg(test)]
mod tests;
