//! Error types shared by the library, playlist, storage and playback layers.
//!
//! Per-file scan problems (unreadable files, duplicate content) are not
//! errors: they are counted in [`crate::library::ScanReport`] instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::library::TrackId;
use crate::playlist::PlaylistId;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the manager, store and player.
#[derive(Debug, Error)]
pub enum Error {
    /// No music directory is recorded, or the recorded one is no longer usable.
    #[error("no music directory selected")]
    NoDirectorySelected,

    /// The scan root could not be opened; nothing was reconciled.
    #[error("music directory {path} is not accessible: {reason}")]
    RootInaccessible {
        /// Root that was requested.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// A reconciliation is already outstanding for this library.
    #[error("a library scan is already in progress")]
    ScanInProgress,

    /// A reconciliation result does not belong to the outstanding scan.
    #[error("scan result is stale and was not applied")]
    StaleScan,

    /// Playlist not found.
    #[error("playlist not found: {0}")]
    PlaylistNotFound(PlaylistId),

    /// Track not found in the library.
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),

    /// The audio output collaborator failed.
    #[error("audio output error: {0}")]
    Audio(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// File system operation failed.
    #[error("file system error at {path}: {message}")]
    FileSystem {
        /// Path where the error occurred.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
