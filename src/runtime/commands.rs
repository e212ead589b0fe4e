use std::path::PathBuf;

use crate::cli::PlaylistCommand;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::library::{ScanReport, Track, TrackId, format_duration, track_label};
use crate::manager::LibraryManager;
use crate::storage::LibraryStore;

pub fn print_default_config() -> Result<()> {
    let text = toml::to_string_pretty(&Settings::default())
        .map_err(|e| Error::Config(::config::ConfigError::Message(e.to_string())))?;
    print!("{text}");
    Ok(())
}

pub fn scan<S: LibraryStore>(manager: &mut LibraryManager<S>, dir: Option<PathBuf>) -> Result<()> {
    let report = match dir {
        Some(dir) => manager.select_root(dir)?,
        None => manager.refresh()?,
    };
    println!("{}", describe_report(&report, manager.tracks().len()));
    Ok(())
}

pub fn list<S: LibraryStore>(
    manager: &LibraryManager<S>,
    settings: &Settings,
    query: Option<&str>,
) -> Result<()> {
    let tracks = match query {
        Some(q) => manager.search(q),
        None => manager.tracks().to_vec(),
    };
    if tracks.is_empty() {
        println!("no tracks");
    }
    for track in &tracks {
        println!("{}", track_line(track, settings));
    }
    Ok(())
}

pub fn remove<S: LibraryStore>(manager: &mut LibraryManager<S>, track: TrackId) -> Result<()> {
    manager.remove_track(track)?;
    println!("removed {track}");
    Ok(())
}

pub fn playlist<S: LibraryStore>(
    manager: &mut LibraryManager<S>,
    settings: &Settings,
    cmd: PlaylistCommand,
) -> Result<()> {
    match cmd {
        PlaylistCommand::List => {
            if manager.playlists().is_empty() {
                println!("no playlists");
            }
            for p in manager.playlists() {
                println!("{}  {} ({} tracks)", p.id, p.name, p.len());
            }
        }
        PlaylistCommand::Create { name } => {
            let playlist = manager.create_playlist(name)?;
            println!("{}", playlist.id);
        }
        PlaylistCommand::Delete { id } => {
            manager.delete_playlist(id)?;
            println!("deleted {id}");
        }
        PlaylistCommand::Show { id } => {
            let name = manager.playlist(id)?.name.clone();
            println!("{name}");
            for (i, track) in manager.playlist_tracks(id)?.iter().enumerate() {
                println!("{:>3}. {}", i + 1, track_line(track, settings));
            }
        }
        PlaylistCommand::Add { id, tracks } => {
            let added = manager.add_tracks(id, &tracks)?;
            println!("added {added} of {} tracks", tracks.len());
        }
        PlaylistCommand::Remove { id, tracks } => {
            let removed = manager.remove_tracks(id, &tracks)?;
            println!("removed {removed} entries");
        }
        PlaylistCommand::Move { id, from, to } => {
            let moved = match (from.checked_sub(1), to.checked_sub(1)) {
                (Some(from), Some(to)) => manager.reorder_playlist(id, from, to)?,
                _ => false,
            };
            if !moved {
                println!("positions out of range; playlist unchanged");
            }
        }
    }
    Ok(())
}

pub(super) fn track_line(track: &Track, settings: &Settings) -> String {
    let label = track_label(
        track,
        &settings.library.display_fields,
        &settings.library.display_separator,
    );
    format!(
        "{}  {:>4}. {}  [{}]",
        track.id,
        track.track_number,
        label,
        format_duration(track.duration_seconds)
    )
}

pub(super) fn describe_report(report: &ScanReport, total: usize) -> String {
    if report.cancelled {
        return "scan cancelled; library unchanged".to_string();
    }
    format!(
        "{total} tracks: {} new, {} kept ({} moved), {} dropped, {} duplicates skipped, {} unreadable",
        report.added,
        report.reused_by_path + report.reused_by_hash,
        report.reused_by_hash,
        report.dropped,
        report.duplicates,
        report.unreadable,
    )
}
