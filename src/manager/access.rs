use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Scoped access to the music directory.
///
/// Acquiring checks that the recorded directory is still a usable directory;
/// a missing or unreadable one is reported as "no directory selected". The
/// grant is released when dropped, on every exit path of a scan.
#[derive(Debug)]
pub struct RootGrant {
    path: PathBuf,
}

impl RootGrant {
    pub fn acquire(path: &Path) -> Result<Self> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                debug!(root = %path.display(), "acquired music directory access");
                Ok(Self {
                    path: path.to_path_buf(),
                })
            }
            Ok(_) => {
                warn!(root = %path.display(), "music directory is not a directory");
                Err(Error::NoDirectorySelected)
            }
            Err(err) => {
                warn!(root = %path.display(), error = %err, "music directory grant is stale");
                Err(Error::NoDirectorySelected)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootGrant {
    fn drop(&mut self) {
        debug!(root = %self.path.display(), "released music directory access");
    }
}
