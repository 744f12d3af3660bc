use crate::error::Error;
use crate::job::FileCandidate;
use chrono::{DateTime, Utc};
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, trace};
use walkdir::WalkDir;

/// Depth-first traversal of one root. Entries are visited in file-name order so a
/// fixed filesystem snapshot always yields the same sequence. Symlinks are never
/// followed.
pub struct PathScanner {
    root: PathBuf,
    ignore_patterns: Vec<Pattern>,
}

impl PathScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_patterns: Vec::new(),
        }
    }

    /// Invalid globs are logged and dropped.
    pub fn with_ignore_patterns<S: AsRef<str>>(mut self, globs: &[S]) -> Self {
        self.ignore_patterns = globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob.as_ref()) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob.as_ref(), e);
                    None
                }
            })
            .collect();
        self
    }

    /// Checks the root up front; a missing or unreadable root is fatal. The
    /// returned iterator is lazy.
    pub fn scan(&self) -> Result<Candidates, Error> {
        let scan_err = |source: io::Error| Error::Scan {
            path: self.root.clone(),
            source,
        };

        let metadata = fs::metadata(&self.root).map_err(scan_err)?;
        if !metadata.is_dir() {
            return Err(scan_err(io::Error::new(
                io::ErrorKind::Other,
                "not a directory",
            )));
        }
        fs::read_dir(&self.root).map_err(scan_err)?;

        debug!("Scanning {}", self.root.display());
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(Candidates {
            walker,
            ignore_patterns: self.ignore_patterns.clone(),
        })
    }
}

pub struct Candidates {
    walker: walkdir::IntoIter,
    ignore_patterns: Vec<Pattern>,
}

impl Candidates {
    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }
}

impl Iterator for Candidates {
    type Item = FileCandidate;

    fn next(&mut self) -> Option<FileCandidate> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    // Unreadable subtrees below the root are skipped.
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    error!("Error reading entry {}: {}", path, err);
                    continue;
                }
            };

            let path = entry.path();
            if entry.depth() > 0 && self.is_ignored(path) {
                trace!("Ignoring {}", path.display());
                if entry.file_type().is_dir() {
                    self.walker.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let modified = match entry.metadata().map_err(io::Error::from).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    error!("Error getting metadata for {}: {}", path.display(), err);
                    continue;
                }
            };

            let candidate = FileCandidate::new(path.to_path_buf(), DateTime::<Utc>::from(modified));
            trace!(
                "File: {}, Last Modified: {}",
                candidate.path.display(),
                candidate.modified_at
            );
            return Some(candidate);
        }
    }
}
