//! HTML listing renderer.
//!
//! Drives the fixed document sequence (header, directory rows, file rows,
//! footer) through one [`OutputSink`] whose implementation is chosen once
//! per render pass from the entry count. The in-memory and spill paths
//! produce byte-identical documents for the same input.
//!
//! The document skeleton (head, heading, footer, scripts) is built with
//! [maud](https://maud.lambda.xyz/): compile-time checked, auto-escaped.
//! Entry rows are assembled at the byte level instead: names are raw OS
//! byte sequences, percent-encoded into the href and XML-escaped into the
//! label without ever passing through a lossy string conversion.

use crate::body::ResponseBody;
use crate::cache::{self, StatCache};
use crate::config::ListingConfig;
use crate::encoding;
use crate::include::{self, Inline};
use crate::scan::{ListEntry, Scanned};
use crate::sink::OutputSink;
use crate::sizefmt;
use chrono::{DateTime, Local};
use maud::{PreEscaped, html};
use std::borrow::Cow;
use std::path::Path;

const STYLE: &str = include_str!("../static/style.css");
const SORT_SCRIPT: &str = include_str!("../static/sort.js");

const OCTET_STREAM: &str = "application/octet-stream";

/// Matches the date regex in the embedded sort script.
const MTIME_FORMAT: &str = "%Y-%b-%d %H:%M:%S";

const TABLE_OPEN: &str = "<div class=\"list\">\n\
    <table summary=\"Directory Listing\" cellpadding=\"0\" cellspacing=\"0\">\n\
    <thead><tr>\
    <th class=\"n\">Name</th>\
    <th class=\"m\">Last Modified</th>\
    <th class=\"s\">Size</th>\
    <th class=\"t\">Type</th>\
    </tr></thead>\n<tbody>\n";

const PARENT_ROW: &str = "<tr class=\"d\">\
    <td class=\"n\"><a href=\"../\">..</a>/</td>\
    <td class=\"m\">&nbsp;</td>\
    <td class=\"s\">- &nbsp;</td>\
    <td class=\"t\">Directory</td>\
    </tr>\n";

const TABLE_CLOSE: &str = "</tbody>\n</table>\n</div>\n";

/// Everything the renderer needs to know about the request being answered.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    /// Decoded URL path of the listed directory, trailing slash included.
    pub url_path: &'a str,
    /// Raw query string, without the leading `?`.
    pub query: &'a str,
    /// Physical path of the listed directory.
    pub fs_path: &'a Path,
}

/// Render the full listing document into `body`, consuming the entries.
pub fn render_listing(
    body: &mut ResponseBody,
    cache: &mut StatCache,
    cfg: &ListingConfig,
    req: &RenderRequest,
    scanned: Scanned,
) {
    let sink = OutputSink::for_entry_count(body, scanned.total());
    render_into(sink, cache, cfg, req, scanned);
}

fn render_into(
    mut sink: OutputSink,
    cache: &mut StatCache,
    cfg: &ListingConfig,
    req: &RenderRequest,
    scanned: Scanned,
) {
    write_header(&mut sink, cache, cfg, req);

    let Scanned { dirs, files } = scanned;
    let mut row = Vec::with_capacity(512);
    for entry in dirs {
        row.clear();
        dir_row(&mut row, &entry);
        sink.append(&row);
    }
    for entry in files {
        row.clear();
        file_row(&mut row, cfg, req.fs_path, &entry);
        sink.append(&row);
    }

    write_footer(&mut sink, cache, cfg, req);
    sink.finish();
}

fn write_header(
    sink: &mut OutputSink,
    cache: &mut StatCache,
    cfg: &ListingConfig,
    req: &RenderRequest,
) {
    if cfg.opts.auto_layout {
        sink.append(b"<!DOCTYPE html>\n<html>\n");
        let head = html! {
            head {
                @if let Some(enc) = &cfg.opts.encoding {
                    meta charset=(enc);
                }
                title { "Index of " (req.url_path) }
                @if let Some(css) = non_empty(cfg.opts.external_css.as_deref()) {
                    meta name="viewport" content="initial-scale=1";
                    link rel="stylesheet" type="text/css" href=(css);
                } @else {
                    style { (PreEscaped(STYLE)) }
                }
            }
        };
        sink.append(head.into_string().as_bytes());
        sink.append(b"\n<body>\n");
    }

    if cfg.opts.show_header.is_some() {
        sink.yield_to(|body| include::include_file(body, cache, cfg, req.fs_path, Inline::Header));
    }

    let heading = html! {
        h2 { "Index of " (req.url_path) }
    };
    sink.append(heading.into_string().as_bytes());
    sink.append(b"\n");
    sink.append(TABLE_OPEN.as_bytes());
    if req.url_path != "/" {
        sink.append(PARENT_ROW.as_bytes());
    }
}

fn write_footer(
    sink: &mut OutputSink,
    cache: &mut StatCache,
    cfg: &ListingConfig,
    req: &RenderRequest,
) {
    sink.append(TABLE_CLOSE.as_bytes());

    if cfg.opts.show_readme.is_some() {
        sink.yield_to(|body| include::include_file(body, cache, cfg, req.fs_path, Inline::Readme));
    }

    if cfg.opts.auto_layout {
        let footer = non_empty(cfg.opts.set_footer.as_deref())
            .or_else(|| non_empty(cfg.server.server_tag.as_deref()));
        if let Some(text) = footer {
            let div = html! {
                div class="foot" { (text) }
            };
            sink.append(div.into_string().as_bytes());
            sink.append(b"\n");
        }

        match non_empty(cfg.opts.external_js.as_deref()) {
            Some(url) => {
                let script = html! {
                    script type="text/javascript" src=(url) {}
                };
                sink.append(script.into_string().as_bytes());
                sink.append(b"\n");
            }
            // Absent or explicitly empty: the embedded script.
            None => write_embedded_script(sink, req.query),
        }

        sink.append(b"</body>\n</html>\n");
    }
}

fn write_embedded_script(sink: &mut OutputSink, query: &str) {
    let (column, ascending) = parse_sort_seed(query);
    let script = format!(
        "\n<script type=\"text/javascript\">\n// <!--\n{SORT_SCRIPT}\n\
         init_sort({column}, {ascending});\n// -->\n</script>\n"
    );
    sink.append(script.as_bytes());
}

/// Initial sort seed from the query string.
///
/// `C=` picks the column (`N`ame, `M`odified, `S`ize, `T`ype/`D` both map
/// to Type), `O=` the direction (`A` ascending, `D` descending).
/// Unrecognized or malformed fragments are ignored; defaults are `(0, 0)`.
fn parse_sort_seed(query: &str) -> (u8, u8) {
    let mut column = 0u8;
    let mut ascending = 0u8;
    for frag in query.split('&') {
        let bytes = frag.as_bytes();
        if bytes.len() < 3 || bytes[1] != b'=' {
            continue;
        }
        match (bytes[0], bytes[2]) {
            (b'C', b'N') => column = 0,
            (b'C', b'M') => column = 1,
            (b'C', b'S') => column = 2,
            (b'C', b'T') | (b'C', b'D') => column = 3,
            (b'O', b'A') => ascending = 1,
            (b'O', b'D') => ascending = 0,
            _ => {}
        }
    }
    (column, ascending)
}

fn dir_row(row: &mut Vec<u8>, entry: &ListEntry) {
    row.extend_from_slice(b"<tr class=\"d\"><td class=\"n\"><a href=\"");
    encoding::append_uri_part(row, entry.name_bytes());
    row.extend_from_slice(b"/\">");
    encoding::append_xml_escaped(row, entry.name_bytes());
    row.extend_from_slice(b"</a>/</td><td class=\"m\">");
    append_mtime(row, entry);
    row.extend_from_slice(
        b"</td><td class=\"s\">- &nbsp;</td><td class=\"t\">Directory</td></tr>\n",
    );
}

fn file_row(row: &mut Vec<u8>, cfg: &ListingConfig, dir: &Path, entry: &ListEntry) {
    row.extend_from_slice(b"<tr><td class=\"n\"><a href=\"");
    encoding::append_uri_part(row, entry.name_bytes());
    row.extend_from_slice(b"\">");
    encoding::append_xml_escaped(row, entry.name_bytes());
    row.extend_from_slice(b"</a></td><td class=\"m\">");
    append_mtime(row, entry);
    row.extend_from_slice(b"</td><td class=\"s\">");
    row.extend_from_slice(sizefmt::format_size(entry.size).as_bytes());
    row.extend_from_slice(b"</td><td class=\"t\">");
    encoding::append_xml_escaped(row, content_type(cfg, dir, entry).as_bytes());
    row.extend_from_slice(b"</td></tr>\n");
}

fn append_mtime(row: &mut Vec<u8>, entry: &ListEntry) {
    let mtime: DateTime<Local> = entry.mtime.into();
    row.extend_from_slice(mtime.format(MTIME_FORMAT).to_string().as_bytes());
}

/// Content type for a file row: xattr override when enabled, then the
/// configured suffix table, then the generic binary type.
fn content_type<'a>(cfg: &'a ListingConfig, dir: &Path, entry: &ListEntry) -> Cow<'a, str> {
    if cfg.server.use_xattr {
        if let Some(found) = cache::mime_by_xattr(&dir.join(&entry.name)) {
            return Cow::Owned(found);
        }
    }
    match cache::mime_by_ext(&cfg.server.mime, entry.name_bytes()) {
        Some(found) => Cow::Borrowed(found),
        None => Cow::Borrowed(OCTET_STREAM),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
