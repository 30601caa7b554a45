//!
//! # Slugs
//!
//! URL-safe identifiers for posts, tags and categories.
//!
//! - [`normalize`] lowercases text and collapses every run of whitespace or
//!   non-word characters into a single hyphen.
//! - [`smart_slugify`] optionally transliterates Bangla text to Latin before
//!   normalizing; without transliteration Bangla letters survive as word
//!   characters and produce a native-script slug.
//! - [`resolve_unique`] appends a millisecond timestamp when a candidate slug
//!   is already taken.

mod transliterate;
mod unique;

use lazy_static::lazy_static;
use regex::Regex;

pub use transliterate::{transliterate, TRANSLITERATION_TABLE};
pub use unique::{resolve_unique, with_disambiguator};

lazy_static! {
    // `\W` is Unicode-aware: letters, marks, digits and connector punctuation
    // are word characters, everything else is a separator.
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[\s\W-]+").unwrap();
}

/// The Bangla Unicode block.
const BANGLA_BLOCK: std::ops::RangeInclusive<char> = '\u{0980}'..='\u{09FF}';

/// Normalizes arbitrary text into a slug.
///
/// The result is lowercase, contains no whitespace, and never starts or ends
/// with a hyphen. Empty input yields an empty slug.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    SEPARATOR_RUN
        .replace_all(lowered.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// Returns `true` if any character of `text` lies in the Bangla block.
pub fn contains_bangla(text: &str) -> bool {
    text.chars().any(|c| BANGLA_BLOCK.contains(&c))
}

/// Builds a slug from a title.
///
/// Bangla text is transliterated only when `force_transliterate` is set;
/// otherwise the text is normalized as-is.
pub fn smart_slugify(text: &str, force_transliterate: bool) -> String {
    if force_transliterate && contains_bangla(text) {
        normalize(&transliterate(text))
    } else {
        normalize(text)
    }
}
