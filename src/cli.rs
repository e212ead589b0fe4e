use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::library::TrackId;
use crate::playlist::PlaylistId;

/// tunevault - a local music library with stable track identities
#[derive(Parser, Debug)]
#[command(name = "tunevault", version, about)]
pub struct Args {
    /// Config file to read instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile the library with the music directory, selecting DIR first if given
    Scan { dir: Option<PathBuf> },

    /// List library tracks
    List {
        /// Only tracks whose title, artist or album contain this text
        #[arg(long, short)]
        query: Option<String>,
    },

    /// Remove a track from the library and from every playlist
    Remove { track: TrackId },

    /// Manage playlists
    #[command(subcommand)]
    Playlist(PlaylistCommand),

    /// Play with an interactive prompt (n, p, space, s, seek SECS, r, q)
    Play {
        /// Play through this playlist
        #[arg(long, conflicts_with = "query")]
        playlist: Option<PlaylistId>,

        /// Play through the tracks matching this text
        #[arg(long, short)]
        query: Option<String>,

        /// Start with shuffle enabled
        #[arg(long, short)]
        shuffle: bool,

        /// Track to start with (defaults to the first of the source)
        track: Option<TrackId>,
    },

    /// Print the default configuration as TOML
    Config,
}

#[derive(Subcommand, Debug)]
pub enum PlaylistCommand {
    /// List playlists
    List,
    /// Create an empty playlist
    Create { name: String },
    /// Delete a playlist
    Delete { id: PlaylistId },
    /// Show the tracks of a playlist
    Show { id: PlaylistId },
    /// Append tracks to a playlist
    Add {
        id: PlaylistId,
        #[arg(required = true)]
        tracks: Vec<TrackId>,
    },
    /// Remove tracks from a playlist
    Remove {
        id: PlaylistId,
        #[arg(required = true)]
        tracks: Vec<TrackId>,
    },
    /// Move the entry at position FROM to position TO (1-based, as shown)
    Move { id: PlaylistId, from: usize, to: usize },
}
