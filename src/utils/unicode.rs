//! Unicode cleaning for text entering the program from outside.
//!
//! A Rust `str` can never hold a surrogate code point (U+D800..=U+DFFF), so the
//! cleaning happens where text is still raw: UTF-8 bytes from external tools or
//! the terminal, and UTF-16 code units. Everything downstream of these
//! functions is surrogate-free by construction.

use std::borrow::Cow;

pub fn is_surrogate(cp: u32) -> bool {
    (0xD800..=0xDFFF).contains(&cp)
}

/// Decode UTF-16 code units, dropping every unpaired surrogate.
///
/// Properly paired surrogates form a supplementary-plane character and are kept.
pub fn clean_utf16(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .filter_map(|r| r.ok())
        .collect()
}

/// Decode UTF-8 bytes, dropping surrogates encoded as three-byte sequences
/// (`ED A0..BF xx`, as produced by CESU-8 / WTF-8 writers).
///
/// Any other invalid sequence becomes U+FFFD, the same as lossy decoding.
pub fn clean_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                if let Some(len) = encoded_surrogate_len(after) {
                    rest = &after[len..];
                    continue;
                }
                out.push(char::REPLACEMENT_CHARACTER);
                let bad = e.error_len().unwrap_or(after.len());
                rest = &after[bad..];
            }
        }
    }
    out
}

/// The `str` form of the cleaner. Always borrowed: `str` excludes surrogates.
pub fn clean_text(text: &str) -> Cow<'_, str> {
    debug_assert!(!text.chars().any(|c| is_surrogate(c as u32)));
    Cow::Borrowed(text)
}

fn encoded_surrogate_len(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [0xED, second, third, ..]
            if (0xA0..=0xBF).contains(second) && (0x80..=0xBF).contains(third) =>
        {
            Some(3)
        }
        _ => None,
    }
}

/// Convert a character index (0-based) to a byte index in the given string.
/// If `n` exceeds the number of characters, returns `s.len()`.
pub fn char_to_byte_index(s: &str, n: usize) -> usize {
    match s.char_indices().nth(n) {
        Some((i, _)) => i,
        None => s.len(),
    }
}

/// First `n` characters of `s`, with an ellipsis when something was cut.
pub fn preview(s: &str, n: usize) -> Cow<'_, str> {
    let end = char_to_byte_index(s, n);
    if end == s.len() {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("{}…", &s[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_drops_lone_surrogates_only() {
        // "a", lone high, "b", paired (U+1F600), lone low, "c"
        let units = [0x61, 0xD800, 0x62, 0xD83D, 0xDE00, 0xDC00, 0x63];
        assert_eq!(clean_utf16(&units), "ab\u{1F600}c");
    }

    #[test]
    fn utf16_reversed_pair_is_two_lone_surrogates() {
        let units = [0xDE00, 0xD83D, 0x41];
        assert_eq!(clean_utf16(&units), "A");
    }

    #[test]
    fn utf8_drops_encoded_surrogates() {
        let mut bytes = b"Lec".to_vec();
        bytes.extend_from_slice(&[0xED, 0xA0, 0xBD]); // U+D83D as CESU-8
        bytes.extend_from_slice(&[0xED, 0xB8, 0x80]); // U+DE00 as CESU-8
        bytes.extend_from_slice("ture ü".as_bytes());
        assert_eq!(clean_utf8(&bytes), "Lecture ü");
    }

    #[test]
    fn utf8_keeps_other_invalid_bytes_as_replacement() {
        let bytes = [b'a', 0xFF, b'b'];
        assert_eq!(clean_utf8(&bytes), "a\u{FFFD}b");
        // ED followed by a non-surrogate continuation is just invalid.
        let bytes = [0xED, 0x41];
        assert_eq!(clean_utf8(&bytes), "\u{FFFD}A");
    }

    #[test]
    fn valid_text_passes_through_unchanged() {
        let s = "Hello World — ∑ 日本 \u{D7FF} \u{E000} \u{1F600}";
        assert_eq!(clean_utf8(s.as_bytes()), s);
        assert!(matches!(clean_text(s), Cow::Borrowed(_)));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let inputs: Vec<Vec<u8>> = vec![
            vec![],
            b"plain".to_vec(),
            vec![0xED, 0xA0, 0x80, b'x', 0xED, 0xBF, 0xBF],
            vec![0xC3, b'(', 0xED, 0xA0],
            vec![0xF0, 0x9F, 0x98, 0x80, 0xFE],
        ];
        for input in inputs {
            let once = clean_utf8(&input);
            let twice = clean_utf8(once.as_bytes());
            assert_eq!(once, twice, "input {:?}", input);
            assert!(!once.chars().any(|c| is_surrogate(c as u32)));
        }

        let units = [0xD800, 0x41, 0xDFFF];
        let once = clean_utf16(&units);
        let wide: Vec<u16> = once.encode_utf16().collect();
        assert_eq!(clean_utf16(&wide), once);
    }

    #[test]
    fn surrogate_range_bounds() {
        assert!(!is_surrogate(0xD7FF));
        assert!(is_surrogate(0xD800));
        assert!(is_surrogate(0xDFFF));
        assert!(!is_surrogate(0xE000));
    }

    #[test]
    fn preview_cuts_on_char_boundaries() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("hi", 10), 2);
        assert_eq!(preview("héllo", 2), "hé…");
        assert_eq!(preview("hi", 5), "hi");
    }
}
