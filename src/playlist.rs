//! Playlists: ordered, user-defined collections of track ids.
//!
//! Entries reference tracks by [`crate::library::TrackId`] only; the library
//! owns the tracks and playlists are pruned whenever tracks disappear.

mod model;
mod store;

pub use model::{Playlist, PlaylistEntry, PlaylistId};
pub use store::PlaylistStore;
