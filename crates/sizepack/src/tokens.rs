//! Whole-token text replacement
//!
//! A match only counts when it does not extend an identifier: if the pattern
//! starts (or ends) with an identifier character, the byte before (or after)
//! the match must not be one. `rowLen` therefore matches in `o.rowLen=1` but
//! not in `rowLength` or `maxRowLen`.

use std::borrow::Cow;

/// Identifier characters of the script and shader languages
pub fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Start offsets of every non-overlapping whole-token occurrence of `pattern`
pub fn token_matches(text: &str, pattern: &str) -> Vec<usize> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let bytes = text.as_bytes();
    let pat = pattern.as_bytes();
    let check_before = is_ident_byte(pat[0]);
    let check_after = is_ident_byte(pat[pat.len() - 1]);

    let mut starts = Vec::new();
    let mut from = 0;
    while let Some(offset) = text[from..].find(pattern) {
        let start = from + offset;
        let end = start + pattern.len();
        let clear_before = !check_before || start == 0 || !is_ident_byte(bytes[start - 1]);
        let clear_after = !check_after || end == bytes.len() || !is_ident_byte(bytes[end]);
        if clear_before && clear_after {
            starts.push(start);
            from = end;
        } else {
            // Advance by one character, not one byte
            from = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    starts
}

pub fn count_tokens(text: &str, pattern: &str) -> usize {
    token_matches(text, pattern).len()
}

/// Replace every whole-token occurrence of `pattern` with `replacement`
pub fn replace_tokens<'a>(text: &'a str, pattern: &str, replacement: &str) -> Cow<'a, str> {
    let starts = token_matches(text, pattern);
    if starts.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for start in starts {
        output.push_str(&text[cursor..start]);
        output.push_str(replacement);
        cursor = start + pattern.len();
    }
    output.push_str(&text[cursor..]);
    Cow::Owned(output)
}
