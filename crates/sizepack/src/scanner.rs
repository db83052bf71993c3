//! Delimiter-token scanner
//!
//! All span extraction in the pipeline (script regions, dev blocks, shader
//! spans) goes through this scanner instead of pattern matching. A [`Marker`]
//! is a short sequence of [`Piece`]s matched ASCII case-insensitively, and
//! [`find_spans`] pairs each opening marker with the nearest following closing
//! marker (non-greedy). An opening marker without any closing marker after it
//! is reported as unmatched and left alone.

use std::ops::Range;

use crate::tokens::is_ident_byte;

/// One element of a marker
#[derive(Debug, Clone, Copy)]
pub enum Piece {
    /// Literal ASCII text, compared case-insensitively
    Lit(&'static str),
    /// First alternative that matches, tried in order
    OneOf(&'static [&'static str]),
    /// Zero or more ASCII whitespace bytes
    Space,
    /// Zero or more spaces or tabs
    Blank,
    /// Zero-width: the next byte is not an identifier byte
    Boundary,
    /// Zero-width: the next byte is not the given byte
    NotFollowedBy(u8),
    /// Everything up to and including the given byte
    Through(u8),
}

/// A delimiter made of pieces, e.g. `//` + space + `--` + space + `dev`
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pieces: &'static [Piece],
}

impl Marker {
    pub const fn new(pieces: &'static [Piece]) -> Self {
        Self { pieces }
    }

    /// Try to match the marker starting exactly at `pos`, returning the end offset
    pub fn match_at(&self, text: &str, pos: usize) -> Option<usize> {
        let bytes = text.as_bytes();
        let mut cursor = pos;
        for piece in self.pieces {
            cursor = match_piece(bytes, cursor, *piece)?;
        }
        Some(cursor)
    }

    /// Find the first occurrence at or after `from`
    pub fn find(&self, text: &str, from: usize) -> Option<Range<usize>> {
        (from..text.len())
            .filter(|&pos| text.is_char_boundary(pos))
            .find_map(|pos| self.match_at(text, pos).map(|end| pos..end))
    }
}

fn match_lit(bytes: &[u8], pos: usize, lit: &str) -> Option<usize> {
    let end = pos + lit.len();
    let candidate = bytes.get(pos..end)?;
    candidate
        .eq_ignore_ascii_case(lit.as_bytes())
        .then_some(end)
}

fn match_piece(bytes: &[u8], pos: usize, piece: Piece) -> Option<usize> {
    match piece {
        Piece::Lit(lit) => match_lit(bytes, pos, lit),
        Piece::OneOf(alternatives) => alternatives
            .iter()
            .find_map(|lit| match_lit(bytes, pos, lit)),
        Piece::Space => Some(skip_while(bytes, pos, u8::is_ascii_whitespace)),
        Piece::Blank => Some(skip_while(bytes, pos, |b| *b == b' ' || *b == b'\t')),
        Piece::Boundary => match bytes.get(pos) {
            Some(byte) if is_ident_byte(*byte) => None,
            _ => Some(pos),
        },
        Piece::NotFollowedBy(forbidden) => match bytes.get(pos) {
            Some(byte) if *byte == forbidden => None,
            _ => Some(pos),
        },
        Piece::Through(stop) => bytes[pos..]
            .iter()
            .position(|byte| *byte == stop)
            .map(|offset| pos + offset + 1),
    }
}

fn skip_while(bytes: &[u8], pos: usize, pred: impl Fn(&u8) -> bool) -> usize {
    pos + bytes[pos..].iter().take_while(|b| pred(b)).count()
}

/// A matched open/close pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The whole span, markers included
    pub outer: Range<usize>,
    /// Text between the markers
    pub inner: Range<usize>,
}

/// Result of scanning a text for delimited spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub spans: Vec<Span>,
    /// Offset of an opening marker that has no closing marker after it
    pub unmatched_open: Option<usize>,
}

/// Pair every `open` with the nearest following `close`
pub fn find_spans(text: &str, open: &Marker, close: &Marker) -> ScanResult {
    let mut result = ScanResult::default();
    let mut from = 0;

    while let Some(open_range) = open.find(text, from) {
        let Some(close_range) = close.find(text, open_range.end) else {
            result.unmatched_open = Some(open_range.start);
            break;
        };
        result.spans.push(Span {
            outer: open_range.start..close_range.end,
            inner: open_range.end..close_range.start,
        });
        from = close_range.end;
    }

    result
}

/// Rebuild `text` with the given (sorted, disjoint) ranges removed
pub fn remove_ranges(text: &str, ranges: &[Range<usize>]) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in ranges {
        output.push_str(&text[cursor..range.start]);
        cursor = range.end;
    }
    output.push_str(&text[cursor..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_START: Marker = Marker::new(&[
        Piece::Lit("//"),
        Piece::Space,
        Piece::Lit("--"),
        Piece::Space,
        Piece::Lit("dev"),
        Piece::Space,
        Piece::Lit("start"),
    ]);
    const DEV_END: Marker = Marker::new(&[
        Piece::Lit("//"),
        Piece::Space,
        Piece::Lit("--"),
        Piece::Space,
        Piece::Lit("dev"),
        Piece::Space,
        Piece::Lit("end"),
    ]);

    #[test]
    fn test_marker_matches_flexible_whitespace_and_case() {
        assert_eq!(DEV_START.match_at("// -- dev start", 0), Some(15));
        assert_eq!(DEV_START.match_at("//--DEV   Start", 0), Some(15));
        assert_eq!(DEV_START.match_at("/ -- dev start", 0), None);
    }

    #[test]
    fn test_find_spans_is_non_greedy() {
        let text = "a // -- dev start x // -- dev end b // -- dev start y // -- dev end c";
        let result = find_spans(text, &DEV_START, &DEV_END);
        assert_eq!(result.spans.len(), 2);
        assert_eq!(&text[result.spans[0].inner.clone()], " x ");
        assert_eq!(&text[result.spans[1].inner.clone()], " y ");
        assert_eq!(result.unmatched_open, None);
    }

    #[test]
    fn test_unmatched_open_is_reported() {
        let text = "// -- dev start\nkeep me";
        let result = find_spans(text, &DEV_START, &DEV_END);
        assert!(result.spans.is_empty());
        assert_eq!(result.unmatched_open, Some(0));
    }

    #[test]
    fn test_boundary_and_through() {
        const TAG: Marker = Marker::new(&[Piece::Lit("<script"), Piece::Boundary, Piece::Through(b'>')]);
        assert_eq!(TAG.match_at("<script type=\"module\">", 0), Some(22));
        assert_eq!(TAG.match_at("<scripts>", 0), None);
        assert_eq!(TAG.match_at("<script", 0), None);
    }

    #[test]
    fn test_one_of_tries_alternatives_in_order() {
        const M: Marker = Marker::new(&[Piece::OneOf(&["//*", "//"]), Piece::Lit("--")]);
        assert_eq!(M.match_at("//*--", 0), Some(5));
        assert_eq!(M.match_at("//--", 0), Some(4));
    }

    #[test]
    fn test_find_and_remove_ranges() {
        const Q: Marker = Marker::new(&[Piece::Lit("`/`")]);
        assert_eq!(Q.find("a `/` b `/`", 0), Some(2..5));
        assert_eq!(Q.find("a `/` b `/`", 3), Some(8..11));
        assert_eq!(remove_ranges("0123456789", &[1..3, 5..6]), "0346789");
    }

    #[test]
    fn test_non_ascii_text_is_scanned_safely() {
        let text = "ä // -- dev start ö // -- dev end ü";
        let result = find_spans(text, &DEV_START, &DEV_END);
        assert_eq!(result.spans.len(), 1);
        assert_eq!(remove_ranges(text, &[result.spans[0].outer.clone()]), "ä  ü");
    }
}
