//! Persistence of the library snapshot.
//!
//! The manager only needs `load`/`save` that round-trip exactly; the JSON file
//! store is the implementation used by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::library::Track;
use crate::playlist::Playlist;

/// On-disk format version for forward compatibility.
pub const STORAGE_VERSION: u32 = 1;

/// Everything persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLibrary {
    pub version: u32,
    /// Music directory chosen by the user, if any.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

impl Default for StoredLibrary {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION,
            root: None,
            tracks: Vec::new(),
            playlists: Vec::new(),
        }
    }
}

/// Load/save collaborator for the library snapshot.
pub trait LibraryStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<StoredLibrary>>;
    fn save(&self, library: &StoredLibrary) -> Result<()>;
}

/// Pretty-printed JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonLibraryStore {
    path: PathBuf,
}

impl JsonLibraryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "library.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LibraryStore for JsonLibraryStore {
    fn load(&self) -> Result<Option<StoredLibrary>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::FileSystem {
                    path: self.path.clone(),
                    message: e.to_string(),
                });
            }
        };

        let library: StoredLibrary = serde_json::from_str(&content)?;
        debug!(
            path = %self.path.display(),
            tracks = library.tracks.len(),
            playlists = library.playlists.len(),
            "loaded library"
        );
        Ok(Some(library))
    }

    fn save(&self, library: &StoredLibrary) -> Result<()> {
        let fs_err = |path: &Path, e: std::io::Error| Error::FileSystem {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| fs_err(parent, e))?;
        }

        let content = serde_json::to_string_pretty(library)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, content).map_err(|e| fs_err(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| fs_err(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            tracks = library.tracks.len(),
            playlists = library.playlists.len(),
            "saved library"
        );
        Ok(())
    }
}
