use lazy_static::lazy_static;
use std::collections::HashMap;

/// Bangla graphemes and their Latin approximations.
///
/// Dependent vowel signs and other combining marks are written as escapes.
/// The nukta letters (ড়, ঢ়, য়) and the two-part vowel signs (ো, ৌ) appear in
/// both their precomposed and decomposed spellings, since user input arrives in
/// either form.
#[rustfmt::skip]
pub const TRANSLITERATION_TABLE: &[(&str, &str)] = &[
    // Independent vowels
    ("অ", "o"), ("আ", "a"), ("ই", "i"), ("ঈ", "i"), ("উ", "u"), ("ঊ", "u"),
    ("ঋ", "ri"), ("এ", "e"), ("ঐ", "oi"), ("ও", "o"), ("ঔ", "ou"),
    // Consonants
    ("ক", "k"), ("খ", "kh"), ("গ", "g"), ("ঘ", "gh"), ("ঙ", "ng"),
    ("চ", "ch"), ("ছ", "ch"), ("জ", "j"), ("ঝ", "jh"), ("ঞ", "n"),
    ("ট", "t"), ("ঠ", "th"), ("ড", "d"), ("ঢ", "dh"), ("ণ", "n"),
    ("ত", "t"), ("থ", "th"), ("দ", "d"), ("ধ", "dh"), ("ন", "n"),
    ("প", "p"), ("ফ", "ph"), ("ব", "b"), ("ভ", "bh"), ("ম", "m"),
    ("য", "j"), ("র", "r"), ("ল", "l"), ("শ", "sh"), ("ষ", "sh"),
    ("স", "s"), ("হ", "h"),
    ("\u{09DC}", "r"), ("\u{09A1}\u{09BC}", "r"),
    ("\u{09DD}", "rh"), ("\u{09A2}\u{09BC}", "rh"),
    ("\u{09DF}", "y"), ("\u{09AF}\u{09BC}", "y"),
    ("ৎ", "t"),
    // Signs: anusvara, visarga, chandrabindu
    ("\u{0982}", "ng"), ("\u{0983}", "h"), ("\u{0981}", "n"),
    // Dependent vowel signs
    ("\u{09BE}", "a"), ("\u{09BF}", "i"), ("\u{09C0}", "i"), ("\u{09C1}", "u"),
    ("\u{09C2}", "u"), ("\u{09C3}", "ri"), ("\u{09C7}", "e"), ("\u{09C8}", "oi"),
    ("\u{09CB}", "o"), ("\u{09C7}\u{09BE}", "o"),
    ("\u{09CC}", "ou"), ("\u{09C7}\u{09D7}", "ou"),
    // Virama joins conjuncts; dropping it simplifies them to their parts.
    ("\u{09CD}", ""),
    // Digits
    ("০", "0"), ("১", "1"), ("২", "2"), ("৩", "3"), ("৪", "4"),
    ("৫", "5"), ("৬", "6"), ("৭", "7"), ("৮", "8"), ("৯", "9"),
];

/// Longest key in the table, in chars.
const MAX_KEY_CHARS: usize = 2;

lazy_static! {
    static ref LOOKUP: HashMap<&'static str, &'static str> =
        TRANSLITERATION_TABLE.iter().copied().collect();
}

/// Replaces every mapped Bangla grapheme in `text` with its Latin form.
///
/// Matching is greedy, so a decomposed nukta letter is read as one grapheme
/// rather than as its base consonant followed by a stray nukta. Characters
/// outside the table pass through unchanged.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    'outer: while !rest.is_empty() {
        for width in (1..=MAX_KEY_CHARS).rev() {
            let Some(end) = char_boundary(rest, width) else {
                continue;
            };
            if let Some(latin) = LOOKUP.get(&rest[..end]) {
                out.push_str(latin);
                rest = &rest[end..];
                continue 'outer;
            }
        }

        // Unmapped: copy one char through.
        let end = char_boundary(rest, 1).unwrap_or(rest.len());
        out.push_str(&rest[..end]);
        rest = &rest[end..];
    }

    out
}

/// Byte offset just past the first `chars` chars of `s`, if it has that many.
fn char_boundary(s: &str, chars: usize) -> Option<usize> {
    let mut indices = s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len()));
    indices.nth(chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_outputs_are_not_keys() {
        for (_, latin) in TRANSLITERATION_TABLE {
            assert!(latin.is_ascii(), "{:?} is not ASCII", latin);
            assert!(!LOOKUP.contains_key(latin), "{:?} is also a key", latin);
        }
    }

    #[test]
    fn test_table_keys_are_unique_and_bounded() {
        assert_eq!(LOOKUP.len(), TRANSLITERATION_TABLE.len());
        for (bangla, _) in TRANSLITERATION_TABLE {
            let chars = bangla.chars().count();
            assert!((1..=MAX_KEY_CHARS).contains(&chars), "{:?}", bangla);
        }
    }

    #[test]
    fn test_transliterate_words() {
        assert_eq!(transliterate("বাংলা"), "bangla");
        assert_eq!(transliterate("কলম"), "klm");
        assert_eq!(transliterate("ঢাকা"), "dhaka");
    }

    #[test]
    fn test_transliterate_digits() {
        assert_eq!(transliterate("২০২৪"), "2024");
    }

    #[test]
    fn test_virama_is_dropped() {
        // ক্ত -> k + t
        assert_eq!(transliterate("ক্ত"), "kt");
    }

    #[test]
    fn test_nukta_letters_both_spellings() {
        assert_eq!(transliterate("\u{09DC}"), "r");
        assert_eq!(transliterate("\u{09A1}\u{09BC}"), "r");
        assert_eq!(transliterate("\u{09AF}\u{09BC}\u{09BE}"), "ya");
        assert_eq!(transliterate("\u{09A2}\u{09BC}"), "rh");
    }

    #[test]
    fn test_two_part_vowel_signs() {
        assert_eq!(transliterate("ক\u{09CB}"), "ko");
        assert_eq!(transliterate("ক\u{09C7}\u{09BE}"), "ko");
        assert_eq!(transliterate("ক\u{09C7}\u{09D7}"), "kou");
    }

    #[test]
    fn test_unmapped_characters_pass_through() {
        assert_eq!(transliterate("Hello, world!"), "Hello, world!");
        assert_eq!(transliterate("ক-x-ন"), "k-x-n");
        assert_eq!(transliterate(""), "");
        // A lone nukta has no mapping.
        assert_eq!(transliterate("\u{09BC}"), "\u{09BC}");
    }
}
