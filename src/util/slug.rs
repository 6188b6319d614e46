use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Maximum length of the text part of an item id.
pub const MAX_SLUG_LEN: usize = 60;

/// Slug used when the text has no usable characters.
const EMPTY_SLUG: &str = "item";

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Lower-case ASCII slug of `text`: diacritics stripped, every run of
/// non-alphanumerics collapsed to `-`, no leading or trailing `-`.
pub fn slugify(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    SEPARATOR_RUNS
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Derive the item id for `text` inside `section_id`.
///
/// The text slug is bounded to [`MAX_SLUG_LEN`] characters and the section
/// slug is prepended with a `-` separator, e.g.
/// `normalize("Sec1", "  São Paulo!! ") == "sec1-sao-paulo"`.
///
/// This is a pure function: collisions between different texts that share
/// a slug are resolved by the item index at registration time.
pub fn normalize(section_id: &str, text: &str) -> String {
    let full = slugify(text);
    let slug = bounded(&full);
    let slug = if slug.is_empty() { EMPTY_SLUG } else { slug };
    let section = slugify(section_id);
    if section.is_empty() {
        slug.to_string()
    } else {
        format!("{}-{}", section, slug)
    }
}

/// Cut a slug to its first [`MAX_SLUG_LEN`] chars. A separator landing
/// on the last kept char stays, so ids match the ones already stored.
fn bounded(slug: &str) -> &str {
    let end = slug
        .char_indices()
        .nth(MAX_SLUG_LEN)
        .map_or(slug.len(), |(i, _)| i);
    &slug[..end]
}
