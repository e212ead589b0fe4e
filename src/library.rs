//! Library module: track model, content identity, directory scanning,
//! metadata extraction and reconciliation of scans against the stored library.

mod display;
mod hash;
mod metadata;
mod model;
mod reconcile;
mod scan;
mod search;

pub use display::{format_duration, track_label};
pub use hash::{hash_bytes, hash_file};
pub use metadata::{LoftyExtractor, MetadataExtractor, TrackTags, fallback_title};
pub use model::{ContentHash, IdMinter, Track, TrackId, renumber};
pub use reconcile::{CancelToken, Reconciler, Reconciliation, ScanReport};
pub use scan::{Candidates, DirectoryScanner, parse_ignore_patterns, read_ignore_patterns};
pub use search::{filter_tracks, matches_query};
