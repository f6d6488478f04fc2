//! Index-file resolution.
//!
//! Before a directory gets a generated listing, the configured index-file
//! names are tried in order; the first that resolves to a regular file is
//! served instead. A missing candidate moves on to the next name, but a
//! permission error is surfaced so the caller refuses the request rather
//! than silently falling back to a listing of a directory the index was
//! supposed to cover.

use crate::cache::{FileKind, StatCache, StatError};
use std::path::{Path, PathBuf};

/// Return the first configured index file present in `dir`.
pub fn resolve(
    cache: &mut StatCache,
    dir: &Path,
    names: &[String],
    follow_symlink: bool,
) -> Result<Option<PathBuf>, StatError> {
    for name in names {
        let candidate = dir.join(name);
        match cache.status(&candidate, follow_symlink) {
            Ok(status) if status.kind == FileKind::File => return Ok(Some(candidate)),
            // A directory or socket named like an index file is not one.
            Ok(_) => continue,
            Err(StatError::NotFound(_)) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_existing_candidate_wins() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.htm"), "old").unwrap();
        fs::write(tmp.path().join("index.html"), "new").unwrap();

        let mut cache = StatCache::new();
        let found = resolve(
            &mut cache,
            tmp.path(),
            &names(&["index.html", "index.htm"]),
            true,
        )
        .unwrap();
        assert_eq!(found, Some(tmp.path().join("index.html")));
    }

    #[test]
    fn missing_candidates_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.htm"), "fallback").unwrap();

        let mut cache = StatCache::new();
        let found = resolve(
            &mut cache,
            tmp.path(),
            &names(&["index.html", "index.htm"]),
            true,
        )
        .unwrap();
        assert_eq!(found, Some(tmp.path().join("index.htm")));
    }

    #[test]
    fn none_when_nothing_matches() {
        let tmp = TempDir::new().unwrap();
        let mut cache = StatCache::new();
        let found = resolve(&mut cache, tmp.path(), &names(&["index.html"]), true).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn directory_named_like_index_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("index.html")).unwrap();
        fs::write(tmp.path().join("index.htm"), "real").unwrap();

        let mut cache = StatCache::new();
        let found = resolve(
            &mut cache,
            tmp.path(),
            &names(&["index.html", "index.htm"]),
            true,
        )
        .unwrap();
        assert_eq!(found, Some(tmp.path().join("index.htm")));
    }

    #[test]
    fn empty_name_list_resolves_to_none() {
        let tmp = TempDir::new().unwrap();
        let mut cache = StatCache::new();
        assert!(resolve(&mut cache, tmp.path(), &[], true).unwrap().is_none());
    }
}
