//! Byte-level encoders for listing output.
//!
//! Entry names come off the filesystem as raw byte sequences with no
//! guaranteed encoding, so both encoders work on `&[u8]` and append into a
//! byte buffer. Every rendered name passes through both, in different
//! positions: percent-encoding for the link target, minimal XML escaping for
//! the visible label. The two are never interchangeable; a percent-encoded
//! label or an XML-escaped href is a bug.

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Bytes that pass through percent-encoding untouched (RFC 3986 unreserved).
///
/// Everything else is encoded, which keeps the result safe inside a
/// double-quoted href attribute without a second escaping pass.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

/// Percent-encode `raw` as a single URL path segment, appending to `out`.
pub fn append_uri_part(out: &mut Vec<u8>, raw: &[u8]) {
    for &byte in raw {
        if is_unreserved(byte) {
            out.push(byte);
        } else {
            out.push(b'%');
            out.push(HEX_DIGITS[(byte >> 4) as usize]);
            out.push(HEX_DIGITS[(byte & 0x0f) as usize]);
        }
    }
}

/// Escape the five XML-special bytes in `raw`, appending to `out`.
///
/// All other bytes pass through unchanged, including non-UTF-8 sequences;
/// the output stream is bytes, not text.
pub fn append_xml_escaped(out: &mut Vec<u8>, raw: &[u8]) {
    for &byte in raw {
        match byte {
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'&' => out.extend_from_slice(b"&amp;"),
            b'"' => out.extend_from_slice(b"&quot;"),
            b'\'' => out.extend_from_slice(b"&#39;"),
            _ => out.push(byte),
        }
    }
}
