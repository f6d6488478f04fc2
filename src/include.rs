//! Inline readme/header rendering.
//!
//! Drops the content of a configured auxiliary file into the document at a
//! fixed point: the header file before the listing table, the readme after
//! it. In encode mode the file is escaped into a `<pre>` block, read in
//! fixed-size chunks so a large file never sits in memory whole; otherwise
//! the raw file is handed to the response as a zero-copy reference.
//!
//! Nothing here can fail the request: a missing, unreadable, or empty file
//! simply produces no output.

use crate::body::ResponseBody;
use crate::cache::StatCache;
use crate::config::ListingConfig;
use crate::encoding;
use std::io::Read;
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 8192;

/// Files up to this size are escaped into one in-memory buffer; larger
/// ones flush each escaped chunk straight to backing temporary storage.
const IN_MEMORY_LIMIT: u64 = 32 * 1024;

/// Which auxiliary file to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline {
    Header,
    Readme,
}

impl Inline {
    fn pre_open(self) -> &'static [u8] {
        match self {
            Inline::Header => b"<pre class=\"header\">",
            Inline::Readme => b"<pre class=\"readme\">",
        }
    }
}

/// Render the configured header or readme file into `body`.
pub fn include_file(
    body: &mut ResponseBody,
    cache: &mut StatCache,
    cfg: &ListingConfig,
    dir: &Path,
    which: Inline,
) {
    let (name, encode) = match which {
        Inline::Header => (cfg.opts.show_header.as_deref(), cfg.opts.encode_header),
        Inline::Readme => (cfg.opts.show_readme.as_deref(), cfg.opts.encode_readme),
    };
    let Some(name) = name else { return };

    let path = resolve(dir, name);
    let (mut file, status) = match cache.open(&path, cfg.server.follow_symlink) {
        Ok(opened) => opened,
        Err(err) => {
            log::debug!("skipping include {}: {err}", path.display());
            return;
        }
    };
    // An empty file is treated as absent.
    if status.size == 0 {
        log::debug!("skipping empty include {}", path.display());
        return;
    }

    if !encode {
        body.append_file_ref(path, status.size);
        return;
    }

    body.append_bytes(which.pre_open());

    let spill = status.size > IN_MEMORY_LIMIT;
    let mut out = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let count = match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) => {
                log::debug!("read failed for include {}: {err}", path.display());
                break;
            }
        };
        encoding::append_xml_escaped(&mut out, &chunk[..count]);
        if spill {
            if let Err(err) = body.append_to_tempfile(&out) {
                log::error!("write to backing storage failed for include: {err}");
                break;
            }
            out.clear();
        }
    }
    if !spill {
        body.commit_buffer(out);
    }

    body.append_bytes(b"</pre>");
}

/// Relative names resolve against the listed directory.
fn resolve(dir: &Path, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn run_include(config: &Config, dir: &Path, which: Inline) -> Vec<u8> {
        let cfg = config.resolve("/").unwrap();
        let mut body = ResponseBody::new();
        let mut cache = StatCache::new();
        include_file(&mut body, &mut cache, &cfg, dir, which);
        body.collect().unwrap()
    }

    #[test]
    fn readme_rendered_escaped_in_pre_block() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.txt"), "see <docs> & notes").unwrap();

        let config = Config::from_str("[listing]\nshow_readme = \"README.txt\"\n").unwrap();
        let out = run_include(&config, tmp.path(), Inline::Readme);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<pre class=\"readme\">see &lt;docs&gt; &amp; notes</pre>"
        );
    }

    #[test]
    fn header_uses_its_own_class() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("HEADER.txt"), "welcome").unwrap();

        let config = Config::from_str("[listing]\nshow_header = \"enable\"\n").unwrap();
        let out = run_include(&config, tmp.path(), Inline::Header);
        assert!(out.starts_with(b"<pre class=\"header\">"));
    }

    #[test]
    fn missing_file_produces_no_output() {
        let tmp = TempDir::new().unwrap();
        let config = Config::from_str("[listing]\nshow_readme = \"README.txt\"\n").unwrap();
        let out = run_include(&config, tmp.path(), Inline::Readme);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_file_treated_as_absent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.txt"), "").unwrap();

        let config = Config::from_str("[listing]\nshow_readme = \"README.txt\"\n").unwrap();
        let out = run_include(&config, tmp.path(), Inline::Readme);
        assert!(out.is_empty());
    }

    #[test]
    fn unconfigured_include_is_noop() {
        let tmp = TempDir::new().unwrap();
        let config = Config::builtin();
        let out = run_include(&config, tmp.path(), Inline::Readme);
        assert!(out.is_empty());
    }

    #[test]
    fn unencoded_include_is_a_file_reference() {
        use crate::body::Chunk;

        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.txt"), "<raw html>").unwrap();

        let config = Config::from_str(
            "[listing]\nshow_readme = \"README.txt\"\nencode_readme = false\n",
        )
        .unwrap();
        let cfg = config.resolve("/").unwrap();
        let mut body = ResponseBody::new();
        let mut cache = StatCache::new();
        include_file(&mut body, &mut cache, &cfg, tmp.path(), Inline::Readme);

        assert!(matches!(body.chunks(), [Chunk::FileRef { .. }]));
        // Raw transfer: no escaping applied.
        assert_eq!(body.collect().unwrap(), b"<raw html>");
    }

    #[test]
    fn large_file_spills_but_output_matches_small_path() {
        use crate::body::Chunk;

        // Just over the in-memory limit, with escapable bytes sprinkled in
        // so chunked escaping is exercised.
        let unit = b"0123456789<>&'\"abcdef";
        let mut content = Vec::new();
        while content.len() <= IN_MEMORY_LIMIT as usize {
            content.extend_from_slice(unit);
        }

        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.txt"), &content).unwrap();

        let config = Config::from_str("[listing]\nshow_readme = \"README.txt\"\n").unwrap();
        let cfg = config.resolve("/").unwrap();
        let mut body = ResponseBody::new();
        let mut cache = StatCache::new();
        include_file(&mut body, &mut cache, &cfg, tmp.path(), Inline::Readme);

        assert!(
            body.chunks()
                .iter()
                .any(|chunk| matches!(chunk, Chunk::Temp(_))),
            "large include should reach backing storage"
        );

        let spilled = body.collect().unwrap();

        // Reference rendering: escape the whole content in one pass.
        let mut expected = b"<pre class=\"readme\">".to_vec();
        encoding::append_xml_escaped(&mut expected, &content);
        expected.extend_from_slice(b"</pre>");
        assert_eq!(spilled, expected);
    }

    #[test]
    fn absolute_name_resolves_outside_dir() {
        let outside = TempDir::new().unwrap();
        let banner = outside.path().join("banner.txt");
        fs::write(&banner, "global banner").unwrap();

        let listed = TempDir::new().unwrap();
        let toml = format!(
            "[listing]\nshow_header = \"{}\"\n",
            banner.display()
        );
        let config = Config::from_str(&toml).unwrap();
        let out = run_include(&config, listed.path(), Inline::Header);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<pre class=\"header\">global banner</pre>"
        );
    }
}
