use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::library::{Track, TrackId, format_duration, track_label};
use crate::manager::{LibraryManager, LibrarySnapshot};
use crate::playback::{PlaybackInfo, PlaybackState, Player, PlayerCmd};
use crate::playlist::PlaylistId;
use crate::storage::LibraryStore;

use super::commands::describe_report;

/// What the `play` command should traverse.
#[derive(Debug)]
pub struct Selection {
    pub playlist: Option<PlaylistId>,
    pub query: Option<String>,
    pub shuffle: bool,
    pub track: Option<TrackId>,
}

const HELP: &str = "commands: n = next, p = previous, space/pause = toggle pause, \
s = shuffle, seek SECS, r = rescan library, enter = status, q = quit";

enum Input {
    Cmd(PlayerCmd),
    Status,
    Rescan,
    Help,
    Quit,
}

pub fn run<S: LibraryStore>(
    manager: &mut LibraryManager<S>,
    settings: &Settings,
    selection: Selection,
) -> Result<()> {
    let library = manager.tracks().to_vec();
    let source: Option<Vec<Track>> = match (selection.playlist, selection.query.as_deref()) {
        (Some(id), _) => Some(manager.playlist_tracks(id)?),
        (None, Some(q)) => Some(manager.search(q)),
        (None, None) => None,
    };

    let first = source.as_deref().unwrap_or(&library).first().map(|t| t.id);
    let Some(start) = selection.track.or(first) else {
        println!("nothing to play");
        return Ok(());
    };

    let mut playback = settings.playback.clone();
    playback.shuffle |= selection.shuffle;
    let player = Player::spawn(library, &playback);
    let handle = player.playback_handle();
    let updates = manager.subscribe();
    player.send(PlayerCmd::Play {
        track: start,
        source,
    })?;

    println!("{HELP}");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let Some(Ok(line)) = lines.next() else {
            break;
        };
        match parse_input(&line) {
            Some(Input::Cmd(cmd)) => {
                if player.send(cmd).is_err() {
                    println!("player stopped");
                    break;
                }
            }
            Some(Input::Status) => {
                if let Ok(info) = handle.lock() {
                    println!("{}", status_line(&info, settings));
                }
            }
            Some(Input::Rescan) => match manager.refresh() {
                Ok(report) => println!("{}", describe_report(&report, manager.tracks().len())),
                Err(err) => println!("rescan failed: {err}"),
            },
            Some(Input::Help) | None => println!("{HELP}"),
            Some(Input::Quit) => break,
        }

        if forward_latest(&updates, &player).is_err() {
            println!("player stopped");
            break;
        }
    }

    player.quit();
    info!("playback finished");
    Ok(())
}

/// Hand the newest published library to the player; older ones are skipped.
fn forward_latest(updates: &Receiver<Arc<LibrarySnapshot>>, player: &Player) -> Result<()> {
    match updates.try_iter().last() {
        Some(snapshot) => player.send(PlayerCmd::SetLibrary(snapshot.tracks.clone())),
        None => Ok(()),
    }
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line == " " {
        return Some(Input::Cmd(PlayerCmd::TogglePause));
    }
    let mut words = line.split_whitespace();
    let input = match words.next() {
        None => Input::Status,
        Some("n" | "next") => Input::Cmd(PlayerCmd::Next),
        Some("p" | "prev") => Input::Cmd(PlayerCmd::Prev),
        Some("pause") => Input::Cmd(PlayerCmd::TogglePause),
        Some("s" | "shuffle") => Input::Cmd(PlayerCmd::ToggleShuffle),
        Some("r" | "rescan") => Input::Rescan,
        Some("seek") => Input::Cmd(PlayerCmd::Seek(words.next()?.parse().ok()?)),
        Some("h" | "help" | "?") => Input::Help,
        Some("q" | "quit") => Input::Quit,
        Some(_) => return None,
    };
    Some(input)
}

fn status_line(info: &PlaybackInfo, settings: &Settings) -> String {
    let state = match info.state {
        PlaybackState::Idle => "stopped",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
    };
    let shuffle = if info.shuffle { " [shuffle]" } else { "" };
    let Some(track) = &info.current else {
        return format!("{state}{shuffle}");
    };

    let label = track_label(
        track,
        &settings.library.display_fields,
        &settings.library.display_separator,
    );
    let mut line = format!(
        "{state}{shuffle}: {label} {}/{}",
        format_duration(info.elapsed.as_secs_f64()),
        format_duration(track.duration_seconds)
    );
    if info.artwork.is_some() {
        line.push_str(" [cover art]");
    }
    if let Some(lyrics) = &info.lyrics {
        line.push_str("\n\n");
        line.push_str(lyrics);
    }
    line
}
