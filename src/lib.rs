//! # dirindex
//!
//! A bounded-memory directory listing engine: scan a filesystem directory,
//! filter and sort its entries, and stream an HTML index of it through a
//! response pipeline. The autoindex core of a web server, packaged as a
//! library with a small CLI around it.
//!
//! # Architecture: One Pass Per Request
//!
//! Each request runs one synchronous pass to completion:
//!
//! ```text
//! handle(request)
//!   ├── config.resolve(url_path)   -> immutable per-request ListingConfig
//!   ├── indexfile.resolve(...)     -> serve an index file instead, if any
//!   ├── scan_directory(...)        -> (dirs, files), filtered
//!   ├── sort_entries(...)          -> byte-wise name order, in place
//!   └── render_listing(...)        -> HTML through one OutputSink
//! ```
//!
//! The renderer owns the memory story. Small listings accumulate in one
//! in-memory buffer; at 256 entries and up the pass switches to a bounded
//! scratch buffer that spills to backing temporary storage, so memory use
//! stays flat no matter how large the directory is. Both paths produce
//! byte-identical documents.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`handler`] | Request pipeline: gating, config resolution, scan, sort, render |
//! | [`scan`] | Directory scanning: filters entries, splits directories from files |
//! | [`sort`] | In-place comb sort by raw name bytes |
//! | [`render`] | HTML state machine: header → rows → footer through a sink |
//! | [`sizefmt`] | Compact human-readable size tokens (`3.2M`) |
//! | [`include`] | Inline readme/header files, escaped and bounded |
//! | [`indexfile`] | Index-file resolution ahead of listing generation |
//! | [`encoding`] | Byte-level percent-encoding and XML escaping |
//! | [`sink`] | The spill-capable output sink |
//! | [`body`] | Response body: ordered memory / file-ref / temp-storage chunks |
//! | [`cache`] | Read-through file-status cache and content-type lookup |
//! | [`config`] | Layered TOML configuration, resolved per request |
//!
//! # Design Decisions
//!
//! ## Names Are Bytes
//!
//! Entry names stay `OsString` end to end. Sorting compares raw bytes,
//! exclude patterns match raw bytes (`regex::bytes`), and the renderer
//! percent-encodes and XML-escapes bytes directly, so a file whose name is
//! not valid UTF-8 still lists, links, and sorts correctly.
//!
//! ## Maud for the Skeleton, Bytes for the Rows
//!
//! The document skeleton (head, heading, footer, scripts) is built with
//! [maud](https://maud.lambda.xyz/): compile-time checked and auto-escaped.
//! Entry rows bypass it because their content is raw bytes; they are
//! assembled with the [`encoding`] helpers and appended to the sink, which
//! is also what lets a render pass stream row by row instead of building
//! one document value.
//!
//! ## Fail Closed, Fail Soft
//!
//! An exclude pattern that cannot be evaluated counts as a match: a bad
//! pattern can hide entries but never expose them. A single entry that
//! fails to stat mid-scan (deleted during the walk) is dropped and the
//! scan continues; only failure to open the directory itself fails the
//! request.

pub mod body;
pub mod cache;
pub mod config;
pub mod encoding;
pub mod handler;
pub mod include;
pub mod indexfile;
pub mod render;
pub mod scan;
pub mod sink;
pub mod sizefmt;
pub mod sort;

#[cfg(test)]
pub(crate) mod test_helpers;
