//! Human-readable size tokens for file rows.
//!
//! Produces the compact `123.4M` form used in the Size column: integer part
//! of at most three digits, one fractional digit, one unit letter. The
//! conversion is deliberately simple rather than exact: it divides by 1024
//! via bit shifts and truncates, trading precision for a fixed-width token
//! the client-side sorter can parse back.

const UNITS: &[u8] = b"KMGTPE";

/// Format a byte count as `<int>.<frac><unit>`.
///
/// Sizes in 1..100 are biased upward before conversion so small files read
/// as `0.1K` instead of a truncated `0.0K`. An integer part that would
/// exceed three digits rolls into the next unit as `0.9`.
pub fn format_size(size: u64) -> String {
    let mut size = size;
    if size > 0 && size < 100 {
        size += 99;
    }

    let mut remain;
    let mut unit = 0usize;
    loop {
        remain = size & 1023;
        size >>= 10;
        if size & !1023 == 0 {
            break;
        }
        unit += 1;
    }

    let mut frac = remain / 100;
    if frac > 9 {
        frac = 9;
    }
    if size > 999 {
        size = 0;
        frac = 9;
        unit += 1;
    }

    format!("{size}.{frac}{}", UNITS[unit] as char)
}
