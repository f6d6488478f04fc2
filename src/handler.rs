//! Request pipeline.
//!
//! One call runs the whole scan → sort → render sequence to completion,
//! synchronously, and either declines the request (`Ok(None)`), produces a
//! finished response, or fails with a classified error the caller maps to
//! an HTTP status. There is no cancellation and no retry; the first fatal
//! condition ends the request.

use crate::body::ResponseBody;
use crate::cache::{self, FileKind, StatCache, StatError};
use crate::config::{Config, ConfigError};
use crate::indexfile;
use crate::render::{self, RenderRequest};
use crate::scan::{self, ScanError};
use crate::sort;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Stat(#[from] StatError),
}

impl Error {
    /// Suggested HTTP status for this failure.
    pub fn status(&self) -> u16 {
        match self {
            Error::Scan(_) => 403,
            Error::Stat(StatError::PermissionDenied(_)) => 403,
            Error::Stat(StatError::NotFound(_)) => 404,
            Error::Stat(StatError::Other { .. }) => 500,
            Error::Config(_) => 500,
        }
    }
}

/// One listing request.
#[derive(Debug, Clone)]
pub struct Request {
    /// Decoded URL path, expected to end with `/` for listings.
    pub url_path: String,
    /// Raw query string, without the leading `?`.
    pub query: String,
    /// Physical directory the URL path maps to.
    pub fs_path: PathBuf,
}

/// A finished response: the Content-Type header value plus the body.
#[derive(Debug)]
pub struct Response {
    pub content_type: String,
    pub body: ResponseBody,
}

/// Handle one request end to end.
///
/// Returns `Ok(None)` when this engine has nothing to say about the
/// request: no trailing slash, listings not activated for the path, or the
/// physical path is not a directory.
pub fn handle(
    config: &Config,
    cache: &mut StatCache,
    req: &Request,
) -> Result<Option<Response>, Error> {
    if !req.url_path.ends_with('/') {
        return Ok(None);
    }

    let cfg = config.resolve(&req.url_path)?;
    if !cfg.opts.activate {
        return Ok(None);
    }

    match cache.status(&req.fs_path, cfg.server.follow_symlink) {
        Ok(status) if status.kind == FileKind::Directory => {}
        Ok(_) => return Ok(None),
        Err(err) => return Err(err.into()),
    }

    if let Some(index) = indexfile::resolve(
        cache,
        &req.fs_path,
        &cfg.server.index_files,
        cfg.server.follow_symlink,
    )? {
        log::debug!("serving {} via index file {}", req.url_path, index.display());
        let status = cache.status(&index, cfg.server.follow_symlink)?;
        let content_type = index
            .file_name()
            .and_then(|name| cache::mime_by_ext(&cfg.server.mime, name.as_encoded_bytes()))
            .unwrap_or("application/octet-stream")
            .to_string();
        let mut body = ResponseBody::new();
        body.append_file_ref(index, status.size);
        return Ok(Some(Response { content_type, body }));
    }

    log::debug!("handling {} as directory listing", req.url_path);

    let mut scanned = scan::scan_directory(&req.fs_path, &cfg)?;
    sort::sort_entries(&mut scanned.dirs);
    sort::sort_entries(&mut scanned.files);

    let mut body = ResponseBody::new();
    let render_req = RenderRequest {
        url_path: &req.url_path,
        query: &req.query,
        fs_path: &req.fs_path,
    };
    render::render_listing(&mut body, cache, &cfg, &render_req, scanned);

    let content_type = match &cfg.opts.encoding {
        Some(enc) => format!("text/html; charset={enc}"),
        None => "text/html".to_string(),
    };
    Ok(Some(Response { content_type, body }))
}
