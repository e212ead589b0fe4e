//! The audio output collaborator and its `rodio` implementation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tracing::debug;

use crate::error::{Error, Result};

/// Decodes and plays one file at a time.
#[cfg_attr(test, mockall::automock)]
pub trait AudioOutput {
    /// Stop whatever is playing and start `path` from the beginning.
    fn play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn seek(&mut self, position: Duration) -> Result<()>;
    fn position(&self) -> Duration;
    /// True once the current file has played to its end.
    fn is_finished(&self) -> bool;
    fn stop(&mut self);
}

/// Plays through the default output device.
pub struct RodioOutput {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioOutput {
    pub fn open() -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| Error::Audio(format!("no audio output device: {e}")))?;
        // rodio logs to stderr when the stream is dropped, which garbles the prompt.
        stream.log_on_drop(false);
        Ok(Self { stream, sink: None })
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.stop();

        let file = File::open(path).map_err(|e| Error::FileSystem {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| Error::Audio(format!("failed to decode {}: {e}", path.display())))?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.play();
        self.sink = Some(sink);

        debug!(path = %path.display(), "output started");
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        match &self.sink {
            Some(sink) => sink
                .try_seek(position)
                .map_err(|e| Error::Audio(format!("seek failed: {e}"))),
            None => Ok(()),
        }
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}
