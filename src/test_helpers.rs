//! Shared test utilities.
//!
//! Fixture directories are described as simple name lists: a trailing `/`
//! makes a directory, anything else becomes a small file. Handler-level
//! helpers run a full request and hand back the rendered document.

use crate::cache::StatCache;
use crate::config::Config;
use crate::handler::{self, Request};
use std::fs;
use std::path::Path;

/// Populate `dir` with the named entries.
///
/// `"sub/"` creates a directory, `"file.txt"` a file whose content is its
/// own name (so sizes are nonzero and predictable).
pub fn populate(dir: &Path, names: &[&str]) {
    for name in names {
        if let Some(dir_name) = name.strip_suffix('/') {
            fs::create_dir_all(dir.join(dir_name)).unwrap();
        } else {
            fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
    }
}

/// Run one request through the handler and return the rendered document.
///
/// Panics if the handler declines; tests that exercise declining call
/// [`handler::handle`] directly.
pub fn render_request(config: &Config, dir: &Path, url_path: &str, query: &str) -> String {
    let mut cache = StatCache::new();
    let req = Request {
        url_path: url_path.to_string(),
        query: query.to_string(),
        fs_path: dir.to_path_buf(),
    };
    let mut resp = handler::handle(config, &mut cache, &req)
        .expect("handler failed")
        .expect("handler declined the request");
    String::from_utf8(resp.body.collect().unwrap()).unwrap()
}
