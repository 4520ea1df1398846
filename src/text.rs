//! Helpful utilities for working with text.

use htmlentity::entity::{self, ICodedDataTrait};
use itertools::Itertools;

/// Converts HTML entities into their single-character equivalents.
///
/// Reddit returns "&" as "&amp;", ">" as "&gt;", and "<" as "&lt;"
/// in titles, bodies, and descriptions; this function converts those
/// HTML entities into single, human-readable characters.
///
/// Unlike [`str::trim`], surrounding whitespace is preserved, since
/// comment bodies may be indented on purpose.
///
/// # Examples
///
/// ```
/// use reddit_cli::text::convert_html_entities;
/// let raw = "&lt;This &amp; That&gt;";
/// let converted = convert_html_entities(raw);
/// assert_eq!(converted, "<This & That>");
/// ```
///
/// ```
/// use reddit_cli::text::convert_html_entities;
/// let raw = "A Plaintext Post";
/// let converted = convert_html_entities(raw);
/// assert_eq!(converted, raw);
/// ```
pub fn convert_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    entity::decode(text.as_bytes())
        .to_string()
        .unwrap_or_else(|_| text.to_string())
}

/// Shortens `text` to at most `width` characters.
///
/// Counts characters, not bytes, so multibyte text is never split.
///
/// # Examples
///
/// ```
/// use reddit_cli::text::truncate;
/// assert_eq!(truncate("Rustaceans unite", 10), "Rustaceans");
/// assert_eq!(truncate("short", 10), "short");
/// ```
pub fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Formats a count with comma thousands separators.
///
/// # Examples
///
/// ```
/// use reddit_cli::text::thousands;
/// assert_eq!(thousands(1234567), "1,234,567");
/// assert_eq!(thousands(999), "999");
/// ```
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let groups = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>();
    groups.iter().join(",")
}
