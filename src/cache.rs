//! Read-through file-status cache and content-type lookup.
//!
//! The cache fronts `fs::metadata` for the paths a request touches more
//! than once (the listed directory, index-file candidates, readme/header
//! files). Errors are classified into the three cases callers act on:
//! permission-denied, not-found, and everything else.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatError {
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("stat {path}: {source}")]
    Other { path: PathBuf, source: io::Error },
}

impl StatError {
    fn classify(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
                Self::NotFound(path.to_path_buf())
            }
            _ => Self::Other {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    File,
    /// Sockets, fifos, unfollowed symlinks. Listable but not servable.
    Other,
}

/// Cached status of one path.
#[derive(Debug, Clone, Copy)]
pub struct FileStatus {
    pub kind: FileKind,
    pub size: u64,
    pub mtime: SystemTime,
}

/// Read-through status cache, one instance per worker.
///
/// Entries are keyed by path and kept for the cache's lifetime; the owner
/// decides how long that is (the CLI keeps one per invocation).
#[derive(Debug, Default)]
pub struct StatCache {
    entries: HashMap<PathBuf, FileStatus>,
}

impl StatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of `path`, from cache or the filesystem.
    pub fn status(&mut self, path: &Path, follow_symlink: bool) -> Result<FileStatus, StatError> {
        if let Some(status) = self.entries.get(path) {
            return Ok(*status);
        }
        let meta = if follow_symlink {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
        .map_err(|err| StatError::classify(path, err))?;

        let kind = if meta.is_dir() {
            FileKind::Directory
        } else if meta.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };
        let status = FileStatus {
            kind,
            size: meta.len(),
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        };
        self.entries.insert(path.to_path_buf(), status);
        Ok(status)
    }

    /// Status plus an open descriptor, for inline inclusion.
    pub fn open(
        &mut self,
        path: &Path,
        follow_symlink: bool,
    ) -> Result<(File, FileStatus), StatError> {
        let status = self.status(path, follow_symlink)?;
        let file = File::open(path).map_err(|err| StatError::classify(path, err))?;
        Ok((file, status))
    }
}

/// Longest-suffix content-type lookup against a configured table.
///
/// Keys carry their leading dot, so multi-part suffixes like `.tar.gz`
/// win over `.gz` when both are present. Comparison ignores ASCII case.
pub fn mime_by_ext<'a>(table: &'a BTreeMap<String, String>, name: &[u8]) -> Option<&'a str> {
    let mut best: Option<&str> = None;
    let mut best_len = 0;
    for (suffix, content_type) in table {
        let s = suffix.as_bytes();
        if s.len() > best_len
            && name.len() >= s.len()
            && name[name.len() - s.len()..].eq_ignore_ascii_case(s)
        {
            best = Some(content_type);
            best_len = s.len();
        }
    }
    best
}

/// Content type from the `user.Content-Type` extended attribute.
#[cfg(unix)]
pub fn mime_by_xattr(path: &Path) -> Option<String> {
    let value = xattr::get(path, "user.Content-Type").ok().flatten()?;
    let value = String::from_utf8(value).ok()?;
    (!value.is_empty()).then_some(value)
}

#[cfg(not(unix))]
pub fn mime_by_xattr(_path: &Path) -> Option<String> {
    None
}
