//! Playback navigation: which track plays next, driven by a command queue on
//! a dedicated player thread that owns the audio output.

mod navigator;
mod output;
mod player;
mod thread;
mod types;

pub use navigator::Navigator;
pub use output::{AudioOutput, RodioOutput};
pub use player::Player;
pub use types::{PlaybackHandle, PlaybackInfo, PlaybackState, PlayerCmd};
