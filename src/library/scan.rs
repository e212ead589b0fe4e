use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::config::LibrarySettings;
use crate::error::{Error, Result};

/// Walks a music root and yields candidate audio files.
///
/// Holds no state between scans; every call to [`DirectoryScanner::scan`]
/// re-reads the ignore file and starts a fresh walk.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    extensions: Vec<String>,
    ignore_file: String,
    follow_links: bool,
    include_hidden: bool,
}

impl DirectoryScanner {
    pub fn new(settings: &LibrarySettings) -> Self {
        let extensions = settings
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            extensions,
            ignore_file: settings.ignore_file.clone(),
            follow_links: settings.follow_links,
            include_hidden: settings.include_hidden,
        }
    }

    pub fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| e == &ext)
            })
            .unwrap_or(false)
    }

    /// Start a walk of `root`. Fails only when the root itself cannot be listed.
    pub fn scan(&self, root: &Path) -> Result<Candidates<'_>> {
        fs::read_dir(root).map_err(|e| Error::RootInaccessible {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        let patterns = read_ignore_patterns(&root.join(&self.ignore_file));
        debug!(
            root = %root.display(),
            patterns = patterns.len(),
            "starting directory scan"
        );

        let include_hidden = self.include_hidden;
        let entries = WalkDir::new(root)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_entry(move |e| include_hidden || e.depth() == 0 || !is_hidden(e.path()));

        Ok(Candidates {
            scanner: self,
            entries: Box::new(entries),
            patterns,
            walk_errors: 0,
        })
    }
}

/// Lazy sequence of candidate audio files produced by a single scan.
///
/// Filters, in order: regular files only, then ignore patterns (literal
/// substrings of the path), then the audio extension set.
pub struct Candidates<'a> {
    scanner: &'a DirectoryScanner,
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
    patterns: Vec<String>,
    walk_errors: usize,
}

impl Candidates<'_> {
    /// Directory entries that could not be read during the walk so far.
    pub fn walk_errors(&self) -> usize {
        self.walk_errors
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Iterator for Candidates<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable directory entry");
                    self.walk_errors += 1;
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let text = path.to_string_lossy();
            if let Some(pattern) = self.patterns.iter().find(|p| text.contains(p.as_str())) {
                trace!(path = %text, pattern = %pattern, "ignored by pattern");
                continue;
            }

            if !self.scanner.is_audio_file(path) {
                continue;
            }

            return Some(entry.into_path());
        }
    }
}

/// Parse an ignore file: one literal substring per line, blank lines dropped.
/// A missing or unreadable file means no patterns.
pub fn read_ignore_patterns(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => parse_ignore_patterns(&content),
        Err(_) => Vec::new(),
    }
}

pub fn parse_ignore_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
