//! Directory scanning.
//!
//! Walks one directory level, filters raw entries against the request
//! configuration, and splits the survivors into two collections,
//! directories and files, ready for sorting and rendering.
//!
//! Only one condition is fatal: the directory itself cannot be opened.
//! Everything that can go wrong with a single entry after that (most
//! commonly a stat race with a concurrent delete) silently drops the entry
//! and the scan continues.

use crate::config::ListingConfig;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to open directory {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
}

/// One scanned entry. Immutable once created; consumed exactly once when
/// its row is serialized.
#[derive(Debug)]
pub struct ListEntry {
    pub name: OsString,
    pub mtime: SystemTime,
    pub size: u64,
}

impl ListEntry {
    /// Raw name bytes, the unit of sorting, encoding, and matching.
    pub fn name_bytes(&self) -> &[u8] {
        self.name.as_encoded_bytes()
    }
}

/// Scan result: two disjoint collections, unsorted.
#[derive(Debug, Default)]
pub struct Scanned {
    pub dirs: Vec<ListEntry>,
    pub files: Vec<ListEntry>,
}

impl Scanned {
    pub fn total(&self) -> usize {
        self.dirs.len() + self.files.len()
    }
}

/// Per-entry name length is capped so dir + name stays within this.
const PATH_MAX: usize = 4096;

/// Scan `dir`, applying the configured filters.
///
/// Filter order per entry: dotfile hiding, readme/header name hiding,
/// exclude patterns (an unusable pattern counts as a match), name length.
/// Survivors are stat'd; entries that fail to stat are dropped.
pub fn scan_directory(dir: &Path, cfg: &ListingConfig) -> Result<Scanned, ScanError> {
    let reader = fs::read_dir(dir).map_err(|source| ScanError::Open {
        path: dir.to_path_buf(),
        source,
    })?;

    let name_max = PATH_MAX.saturating_sub(dir.as_os_str().len() + 1);
    let mut scanned = Scanned::default();

    // read_dir already omits the `.` and `..` pseudo-entries.
    for dent in reader {
        let Ok(dent) = dent else { continue };
        let name = dent.file_name();
        let bytes = name.as_encoded_bytes();

        if cfg.opts.hide_dotfiles && bytes.first() == Some(&b'.') {
            continue;
        }
        if cfg.opts.hide_readme_file
            && cfg
                .opts
                .show_readme
                .as_deref()
                .is_some_and(|readme| readme.as_bytes() == bytes)
        {
            continue;
        }
        if cfg.opts.hide_header_file
            && cfg
                .opts
                .show_header
                .as_deref()
                .is_some_and(|header| header.as_bytes() == bytes)
        {
            continue;
        }
        if !cfg.excludes.is_empty() && cfg.excludes.is_excluded(bytes) {
            continue;
        }
        if bytes.len() > name_max {
            continue;
        }

        let path = dent.path();
        let meta = if cfg.server.follow_symlink {
            fs::metadata(&path)
        } else {
            fs::symlink_metadata(&path)
        };
        let meta = match meta {
            Ok(meta) => meta,
            Err(err) => {
                // Entry vanished or became unreadable mid-scan.
                log::debug!("dropping entry {}: {err}", path.display());
                continue;
            }
        };

        let entry = ListEntry {
            name,
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: meta.len(),
        };
        if meta.is_dir() {
            scanned.dirs.push(entry);
        } else {
            scanned.files.push(entry);
        }
    }

    Ok(scanned)
}
