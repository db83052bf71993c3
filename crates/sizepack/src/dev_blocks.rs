//! Development block stripping
//!
//! Removes every span between a `// -- dev start` and the next `// -- dev end`
//! marker, markers included. Markers are case-insensitive and tolerate any
//! whitespace between their words. Blanks and one line break directly after
//! the end marker are removed with the block.

use log::{info, warn};

use crate::{
    scanner::{Marker, Piece, find_spans, remove_ranges},
    types::CodeUnit,
};

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
    Piece::Blank,
]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedCode {
    pub code: CodeUnit,
    /// Literal text of every removed block, in order
    pub removed: Vec<String>,
}

pub fn strip_dev_blocks(code: &CodeUnit) -> StrippedCode {
    let text = code.as_str();
    let scan = find_spans(text, &DEV_START, &DEV_END);

    if let Some(offset) = scan.unmatched_open {
        warn!("Dev block starting at offset {offset} has no end marker, leaving it in place");
    }

    let ranges: Vec<_> = scan
        .spans
        .iter()
        .map(|span| span.outer.start..consume_line_break(text, span.outer.end))
        .collect();

    let removed: Vec<String> = ranges
        .iter()
        .map(|range| text[range.clone()].to_owned())
        .collect();

    if removed.is_empty() {
        info!("No dev blocks found to remove.");
    }
    for (i, block) in removed.iter().enumerate() {
        info!("Dev block #{} to remove:\n---\n{block}\n---", i + 1);
    }

    StrippedCode {
        code: CodeUnit::new(remove_ranges(text, &ranges)),
        removed,
    }
}

fn consume_line_break(text: &str, end: usize) -> usize {
    let rest = &text[end..];
    if rest.starts_with("\r\n") {
        end + 2
    } else if rest.starts_with('\n') {
        end + 1
    } else {
        end
    }
}
