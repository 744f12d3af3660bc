use crate::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TidyReport {
    pub matched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Recursively deletes files with the given extension (case-insensitive).
pub fn delete_with_extension(root: &Path, extension: &str) -> Result<TidyReport, Error> {
    let files = files_with_extension(root, extension)?;
    let mut report = TidyReport {
        matched: files.len(),
        ..Default::default()
    };

    for path in files {
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted: {}", path.display());
                report.succeeded += 1;
            }
            Err(e) => {
                error!("Error deleting file {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    info!("Total .{} files deleted: {}", extension, report.succeeded);
    Ok(report)
}

/// Moves every matching file under `source` directly into `target`. An existing
/// file at the destination is left alone and counted as a failure.
pub fn move_with_extension(source: &Path, target: &Path, extension: &str) -> Result<TidyReport, Error> {
    if same_directory(source, target) {
        return Err(Error::InvalidSetting(
            "source and target directories cannot be the same".to_string(),
        ));
    }
    fs::create_dir_all(target)?;

    let files = files_with_extension(source, extension)?;
    let mut report = TidyReport {
        matched: files.len(),
        ..Default::default()
    };

    for path in files {
        let Some(name) = path.file_name() else {
            continue;
        };
        let destination = target.join(name);
        match move_file(&path, &destination) {
            Ok(()) => {
                info!("Moved: {} to {}", path.display(), destination.display());
                report.succeeded += 1;
            }
            Err(e) => {
                error!("Error moving file {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    info!("Total .{} files moved: {}", extension, report.succeeded);
    Ok(report)
}

fn files_with_extension(root: &Path, extension: &str) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::Scan {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        });
    }
    let extension = extension.trim_start_matches('.');

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Error reading entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        // Different filesystem: copy then remove.
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
