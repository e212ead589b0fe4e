use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::PlaybackSettings;
use crate::error::{Error, Result};
use crate::library::Track;

use super::output::{AudioOutput, RodioOutput};
use super::thread::spawn_player_thread;
use super::types::{PlaybackHandle, PlaybackInfo, PlayerCmd};

/// Handle to the player thread. Commands are applied in the order sent.
pub struct Player {
    tx: Sender<PlayerCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Spawn a player on the default audio device.
    pub fn spawn(library: Vec<Track>, settings: &PlaybackSettings) -> Self {
        Self::spawn_with(library, settings, RodioOutput::open)
    }

    pub fn spawn_with<O, F>(
        library: Vec<Track>,
        settings: &PlaybackSettings,
        open_output: F,
    ) -> Self
    where
        O: AudioOutput + 'static,
        F: FnOnce() -> Result<O> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo {
            shuffle: settings.shuffle,
            ..PlaybackInfo::default()
        }));

        let handle = spawn_player_thread(
            open_output,
            library,
            settings.shuffle,
            rx,
            playback.clone(),
            Duration::from_millis(settings.tick_ms.max(1)),
        );

        Self {
            tx,
            playback,
            join: Mutex::new(Some(handle)),
        }
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    pub fn send(&self, cmd: PlayerCmd) -> Result<()> {
        self.tx
            .send(cmd)
            .map_err(|_| Error::Audio("player thread has stopped".into()))
    }

    /// Stop playback and wait for the thread to exit.
    pub fn quit(&self) {
        let _ = self.send(PlayerCmd::Quit);

        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }
}
