//! Listing configuration.
//!
//! Handles loading, merging, and per-request resolution of the engine's
//! TOML configuration. Resolution is layered: built-in defaults are
//! overridden by the `[listing]` table, which is overridden by every
//! `[[rule]]` whose `prefix` matches the request URL path, in file order.
//! The result is one immutable [`ListingConfig`] per request; nothing
//! downstream ever mutates configuration.
//!
//! ## Config File Shape
//!
//! ```toml
//! # Server-level settings
//! server_tag = "dirindex/0.3"
//! follow_symlink = true
//! use_xattr = false
//! index_files = ["index.html", "index.htm"]
//!
//! [mime]
//! ".log" = "text/plain"        # added on top of the built-in table
//!
//! [listing]
//! activate = true
//! hide_dotfiles = true
//! show_readme = "README.txt"   # "enable" and "disable" also accepted
//! exclude = ["~$", "^#"]
//!
//! [[rule]]
//! prefix = "/private/"
//! [rule.listing]
//! activate = false
//! ```
//!
//! Overlays are sparse: a rule only names the keys it overrides. Unknown
//! keys are rejected to catch typos early.

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Options for one listing scope.
///
/// All fields have defaults matching a locked-down server: listings are off
/// until `activate` is set, and dotfiles are hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingOptions {
    /// Generate listings at all. Off by default.
    pub activate: bool,
    /// Hide entries whose name starts with a dot.
    pub hide_dotfiles: bool,
    /// Regex patterns; a name matching any of them is skipped.
    pub exclude: Vec<String>,
    /// Stylesheet URL; when set, replaces the embedded default styles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_css: Option<String>,
    /// Script URL; when set non-empty, replaces the embedded sort script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_js: Option<String>,
    /// Character encoding label for the charset meta tag and Content-Type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Readme file rendered after the listing table.
    /// `"enable"` selects `README.txt`, `"disable"` unsets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_readme: Option<String>,
    /// Hide the readme file's own entry from the listing.
    pub hide_readme_file: bool,
    /// Header file rendered before the listing table.
    /// `"enable"` selects `HEADER.txt`, `"disable"` unsets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_header: Option<String>,
    /// Hide the header file's own entry from the listing.
    pub hide_header_file: bool,
    /// Footer text; takes priority over the server tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_footer: Option<String>,
    /// Escape the readme into a `<pre>` block instead of sending it raw.
    pub encode_readme: bool,
    /// Escape the header into a `<pre>` block instead of sending it raw.
    pub encode_header: bool,
    /// Emit the full HTML document (head, styles, footer, script). When
    /// off, only the heading and table fragment are produced.
    pub auto_layout: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            activate: false,
            hide_dotfiles: true,
            exclude: Vec::new(),
            external_css: None,
            external_js: None,
            encoding: None,
            show_readme: None,
            hide_readme_file: false,
            show_header: None,
            hide_header_file: false,
            set_footer: None,
            encode_readme: true,
            encode_header: true,
            auto_layout: true,
        }
    }
}

impl ListingOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(enc) = &self.encoding {
            let ok = !enc.is_empty()
                && enc
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));
            if !ok {
                return Err(ConfigError::Validation(format!(
                    "invalid encoding label {enc:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Server-level settings shared by every request.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server identification string, used as the fallback footer.
    pub server_tag: Option<String>,
    /// Follow symbolic links when classifying entries.
    pub follow_symlink: bool,
    /// Consult the `user.Content-Type` extended attribute before the
    /// extension table (unix only).
    pub use_xattr: bool,
    /// Index-file names tried, in order, before generating a listing.
    pub index_files: Vec<String>,
    /// Suffix-to-content-type table, keys carrying the leading dot.
    pub mime: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_tag: None,
            follow_symlink: true,
            use_xattr: false,
            index_files: Vec::new(),
            mime: default_mime_table(),
        }
    }
}

/// Built-in suffix table covering the types a listing commonly meets.
/// User `[mime]` entries are layered on top and may override these.
pub fn default_mime_table() -> BTreeMap<String, String> {
    [
        (".html", "text/html"),
        (".htm", "text/html"),
        (".txt", "text/plain"),
        (".md", "text/markdown"),
        (".css", "text/css"),
        (".js", "text/javascript"),
        (".json", "application/json"),
        (".xml", "application/xml"),
        (".pdf", "application/pdf"),
        (".zip", "application/zip"),
        (".gz", "application/gzip"),
        (".tar", "application/x-tar"),
        (".tar.gz", "application/gzip"),
        (".png", "image/png"),
        (".jpg", "image/jpeg"),
        (".jpeg", "image/jpeg"),
        (".gif", "image/gif"),
        (".svg", "image/svg+xml"),
        (".webp", "image/webp"),
        (".avif", "image/avif"),
        (".mp3", "audio/mpeg"),
        (".mp4", "video/mp4"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Ordered exclude rules; a name matching any rule is skipped.
///
/// A pattern that fails to compile stays in the set as an always-matching
/// rule: an unusable pattern can only ever widen the exclusion, never
/// narrow it or abort the scan.
#[derive(Debug, Default)]
pub struct ExcludeSet {
    rules: Vec<Option<Regex>>,
}

impl ExcludeSet {
    pub fn compile(patterns: &[String]) -> Self {
        let rules = patterns
            .iter()
            .map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(err) => {
                    log::warn!(
                        "exclude pattern {pattern:?} unusable, excluding everything: {err}"
                    );
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_excluded(&self, name: &[u8]) -> bool {
        self.rules.iter().any(|rule| match rule {
            Some(re) => re.is_match(name),
            None => true,
        })
    }
}

/// Immutable per-request render configuration.
///
/// Built once by [`Config::resolve`] and passed by reference into the
/// scanner, includer, and renderer.
#[derive(Debug)]
pub struct ListingConfig<'a> {
    pub opts: ListingOptions,
    pub excludes: ExcludeSet,
    pub server: &'a ServerConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct RawFile {
    server_tag: Option<String>,
    follow_symlink: Option<bool>,
    use_xattr: Option<bool>,
    index_files: Option<Vec<String>>,
    mime: Option<BTreeMap<String, String>>,
    listing: Option<toml::Value>,
    rule: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    prefix: String,
    listing: toml::Value,
}

/// Parsed configuration: server settings, the base listing table, and
/// prefix-matched overlay rules in file order.
#[derive(Debug)]
pub struct Config {
    pub server: ServerConfig,
    listing_base: toml::Value,
    rules: Vec<(String, toml::Value)>,
}

impl Config {
    /// Built-in defaults with no config file (listings inactive).
    pub fn builtin() -> Self {
        // Defaults always serialize and resolve; an error here would be a
        // defect in the defaults themselves.
        match Self::from_str("") {
            Ok(config) => config,
            Err(err) => {
                log::error!("built-in defaults failed to resolve: {err}");
                Self {
                    server: ServerConfig::default(),
                    listing_base: toml::Value::Table(toml::Table::new()),
                    rules: Vec::new(),
                }
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawFile = toml::from_str(content)?;

        let mut server = ServerConfig {
            server_tag: raw.server_tag,
            ..ServerConfig::default()
        };
        if let Some(follow) = raw.follow_symlink {
            server.follow_symlink = follow;
        }
        if let Some(use_xattr) = raw.use_xattr {
            server.use_xattr = use_xattr;
        }
        if let Some(names) = raw.index_files {
            server.index_files = names;
        }
        if let Some(mime) = raw.mime {
            server.mime.extend(mime);
        }

        let defaults = toml::Value::try_from(ListingOptions::default())?;
        let listing_base = match raw.listing {
            Some(overlay) => merge_toml(defaults, overlay),
            None => defaults,
        };

        let mut rules = Vec::with_capacity(raw.rule.len());
        for rule in raw.rule {
            if !rule.prefix.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "rule prefix {:?} must start with '/'",
                    rule.prefix
                )));
            }
            rules.push((rule.prefix, rule.listing));
        }

        let config = Self {
            server,
            listing_base,
            rules,
        };
        // Surface typos and bad values in the base table at load time.
        config.resolve("/")?;
        Ok(config)
    }

    /// Resolve the immutable listing configuration for one request.
    ///
    /// Every rule whose prefix matches `url_path` is merged onto the base
    /// table in file order, then the result is deserialized, normalized,
    /// and validated, and its exclude patterns compiled.
    pub fn resolve(&self, url_path: &str) -> Result<ListingConfig<'_>, ConfigError> {
        let mut value = self.listing_base.clone();
        for (prefix, overlay) in &self.rules {
            if url_path.starts_with(prefix.as_str()) {
                value = merge_toml(value, overlay.clone());
            }
        }

        let mut opts: ListingOptions = value.try_into()?;
        normalize_include_name(&mut opts.show_readme, "README.txt");
        normalize_include_name(&mut opts.show_header, "HEADER.txt");
        opts.validate()?;

        let excludes = ExcludeSet::compile(&opts.exclude);
        Ok(ListingConfig {
            opts,
            excludes,
            server: &self.server,
        })
    }
}

/// Map the historical `enable`/`disable` values onto a concrete file name,
/// and treat an empty name as unset.
fn normalize_include_name(name: &mut Option<String>, enabled_default: &str) {
    match name.as_deref() {
        Some("enable") => *name = Some(enabled_default.to_string()),
        Some("disable") | Some("") => *name = None,
        _ => {}
    }
}

/// Deep-merge two TOML values.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults() {
        let config = Config::builtin();
        let resolved = config.resolve("/").unwrap();
        assert!(!resolved.opts.activate);
        assert!(resolved.opts.hide_dotfiles);
        assert!(resolved.opts.encode_readme);
        assert!(resolved.opts.auto_layout);
        assert!(resolved.excludes.is_empty());
        assert!(resolved.server.follow_symlink);
    }

    #[test]
    fn listing_table_overrides_defaults() {
        let config = Config::from_str(
            "[listing]\nactivate = true\nhide_dotfiles = false\nencoding = \"utf-8\"\n",
        )
        .unwrap();
        let resolved = config.resolve("/").unwrap();
        assert!(resolved.opts.activate);
        assert!(!resolved.opts.hide_dotfiles);
        assert_eq!(resolved.opts.encoding.as_deref(), Some("utf-8"));
        // Untouched keys keep their defaults
        assert!(resolved.opts.encode_header);
    }

    #[test]
    fn rule_overlay_applies_by_prefix() {
        let config = Config::from_str(
            "[listing]\nactivate = true\n\n\
             [[rule]]\nprefix = \"/private/\"\n[rule.listing]\nactivate = false\n",
        )
        .unwrap();
        assert!(config.resolve("/pub/").unwrap().opts.activate);
        assert!(!config.resolve("/private/docs/").unwrap().opts.activate);
    }

    #[test]
    fn later_rules_win() {
        let config = Config::from_str(
            "[[rule]]\nprefix = \"/\"\n[rule.listing]\nactivate = true\n\n\
             [[rule]]\nprefix = \"/off/\"\n[rule.listing]\nactivate = false\n",
        )
        .unwrap();
        assert!(config.resolve("/anything/").unwrap().opts.activate);
        assert!(!config.resolve("/off/").unwrap().opts.activate);
    }

    #[test]
    fn enable_normalizes_to_default_names() {
        let config = Config::from_str(
            "[listing]\nshow_readme = \"enable\"\nshow_header = \"enable\"\n",
        )
        .unwrap();
        let resolved = config.resolve("/").unwrap();
        assert_eq!(resolved.opts.show_readme.as_deref(), Some("README.txt"));
        assert_eq!(resolved.opts.show_header.as_deref(), Some("HEADER.txt"));
    }

    #[test]
    fn disable_and_empty_normalize_to_unset() {
        let config = Config::from_str(
            "[listing]\nshow_readme = \"disable\"\nshow_header = \"\"\n",
        )
        .unwrap();
        let resolved = config.resolve("/").unwrap();
        assert!(resolved.opts.show_readme.is_none());
        assert!(resolved.opts.show_header.is_none());
    }

    #[test]
    fn unknown_listing_key_is_error() {
        let result = Config::from_str("[listing]\nactivat = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_encoding_label_is_error() {
        let result = Config::from_str("[listing]\nencoding = \"utf-8\\\"injected\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn rule_prefix_must_be_absolute() {
        let result = Config::from_str(
            "[[rule]]\nprefix = \"private/\"\n[rule.listing]\nactivate = false\n",
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn mime_entries_layer_over_defaults() {
        let config = Config::from_str(
            "[mime]\n\".log\" = \"text/plain\"\n\".html\" = \"application/xhtml+xml\"\n",
        )
        .unwrap();
        assert_eq!(
            config.server.mime.get(".log").map(String::as_str),
            Some("text/plain")
        );
        assert_eq!(
            config.server.mime.get(".html").map(String::as_str),
            Some("application/xhtml+xml")
        );
        // Defaults not named by the user survive
        assert_eq!(
            config.server.mime.get(".png").map(String::as_str),
            Some("image/png")
        );
    }

    // =========================================================================
    // Exclude set
    // =========================================================================

    #[test]
    fn exclude_matches_any_rule() {
        let set = ExcludeSet::compile(&["~$".to_string(), "^#".to_string()]);
        assert!(set.is_excluded(b"draft.txt~"));
        assert!(set.is_excluded(b"#lockfile"));
        assert!(!set.is_excluded(b"kept.txt"));
    }

    #[test]
    fn exclude_matches_raw_bytes() {
        let set = ExcludeSet::compile(&["\\.bak$".to_string()]);
        assert!(set.is_excluded(&[0xff, 0xfe, b'.', b'b', b'a', b'k']));
    }

    #[test]
    fn invalid_pattern_fails_closed() {
        let set = ExcludeSet::compile(&["[unclosed".to_string()]);
        assert!(set.is_excluded(b"anything-at-all"));
        assert!(set.is_excluded(b""));
    }

    #[test]
    fn empty_set_excludes_nothing() {
        let set = ExcludeSet::compile(&[]);
        assert!(set.is_empty());
        assert!(!set.is_excluded(b"name"));
    }

    // =========================================================================
    // TOML merge
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_nested_tables() {
        let base: toml::Value = toml::from_str("[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 9").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(9));
    }

    #[test]
    fn merge_toml_array_replaces() {
        let base: toml::Value = toml::from_str("a = [1, 2]").unwrap();
        let overlay: toml::Value = toml::from_str("a = [3]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_array().unwrap().len(), 1);
    }
}
