//! Command dispatch for the `tunevault` binary.

use tracing::debug;

use crate::cli::{Args, Command};
use crate::error::{Error, Result};
use crate::logging;
use crate::manager::LibraryManager;
use crate::storage::JsonLibraryStore;

mod commands;
mod play;
mod settings;

pub use settings::load_settings;

pub fn run(args: Args) -> Result<()> {
    let settings = load_settings(args.config.as_deref());

    if let Command::Config = args.command {
        return commands::print_default_config();
    }

    let _log_guard = logging::init(&settings.logging)?;

    let library_file = settings.storage.library_path().ok_or_else(|| {
        Error::Config(::config::ConfigError::Message(
            "no data directory found; set storage.library_file".to_string(),
        ))
    })?;
    let store = JsonLibraryStore::new(library_file);
    debug!(path = %store.path().display(), "using library file");
    let mut manager = LibraryManager::open(store, settings.library.clone())?;

    match args.command {
        Command::Scan { dir } => commands::scan(&mut manager, dir),
        Command::List { query } => commands::list(&manager, &settings, query.as_deref()),
        Command::Remove { track } => commands::remove(&mut manager, track),
        Command::Playlist(cmd) => commands::playlist(&mut manager, &settings, cmd),
        Command::Play {
            playlist,
            query,
            shuffle,
            track,
        } => play::run(
            &mut manager,
            &settings,
            play::Selection {
                playlist,
                query,
                shuffle,
                track,
            },
        ),
        Command::Config => Ok(()),
    }
}
