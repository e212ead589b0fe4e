use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::Result;
use crate::library::Track;

use super::navigator::Navigator;
use super::output::AudioOutput;
use super::types::{PlaybackHandle, PlayerCmd};

/// Run the navigator on its own thread. The output is built inside the thread
/// because audio streams are tied to the thread that opened them.
pub(super) fn spawn_player_thread<O, F>(
    open_output: F,
    library: Vec<Track>,
    shuffle: bool,
    rx: Receiver<PlayerCmd>,
    playback: PlaybackHandle,
    tick: Duration,
) -> JoinHandle<()>
where
    O: AudioOutput + 'static,
    F: FnOnce() -> Result<O> + Send + 'static,
{
    thread::spawn(move || {
        let output = match open_output() {
            Ok(output) => output,
            Err(err) => {
                error!(error = %err, "audio output unavailable; player stopped");
                return;
            }
        };
        let mut navigator = Navigator::new(output, library, shuffle);
        publish(&navigator, &playback);

        loop {
            let cmd = match rx.recv_timeout(tick) {
                Ok(cmd) => cmd,
                // End-of-track goes through the same path as queued commands.
                Err(RecvTimeoutError::Timeout) if navigator.poll_finished() => {
                    PlayerCmd::TrackFinished
                }
                Err(RecvTimeoutError::Timeout) => {
                    publish(&navigator, &playback);
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let keep_running = dispatch(&mut navigator, cmd);
            publish(&navigator, &playback);
            if !keep_running {
                break;
            }
        }

        navigator.stop();
        publish(&navigator, &playback);
        debug!("player thread exited");
    })
}

/// Apply one command. Returns false on `Quit`.
fn dispatch<O: AudioOutput>(navigator: &mut Navigator<O>, cmd: PlayerCmd) -> bool {
    let result = match cmd {
        PlayerCmd::Play { track, source } => navigator.play(track, source),
        PlayerCmd::SetSource(tracks) => {
            navigator.set_source(tracks);
            Ok(())
        }
        PlayerCmd::SetLibrary(tracks) => {
            navigator.set_library(tracks);
            Ok(())
        }
        PlayerCmd::ToggleShuffle => {
            navigator.toggle_shuffle();
            Ok(())
        }
        PlayerCmd::Pause => {
            navigator.pause();
            Ok(())
        }
        PlayerCmd::Resume => {
            navigator.resume();
            Ok(())
        }
        PlayerCmd::TogglePause => {
            navigator.toggle_pause();
            Ok(())
        }
        PlayerCmd::Next => navigator.next().map(drop),
        PlayerCmd::Prev => navigator.previous().map(drop),
        PlayerCmd::Seek(seconds) => navigator.seek(seconds).map(drop),
        PlayerCmd::TrackFinished => navigator.on_finished(),
        PlayerCmd::Quit => return false,
    };

    if let Err(err) = result {
        warn!(error = %err, "playback command failed");
    }
    true
}

fn publish<O: AudioOutput>(navigator: &Navigator<O>, playback: &PlaybackHandle) {
    if let Ok(mut info) = playback.lock() {
        *info = navigator.info();
    }
}
