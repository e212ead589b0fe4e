//! tunevault: a local music library whose tracks keep a stable identity
//! across renames, moves and rescans, with playlists and a playback navigator.

pub mod cli;
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod manager;
pub mod playback;
pub mod playlist;
pub mod runtime;
pub mod storage;

pub use error::{Error, Result};
