//! Script region extraction
//!
//! Splits the document into a markup skeleton and the ordered bodies of its
//! `<script ...>...</script>` regions. A document without scripts is a valid,
//! if degenerate, build.

use log::{debug, info, warn};

use crate::{
    scanner::{Marker, Piece, find_spans, remove_ranges},
    types::{CodeUnit, MarkupSkeleton},
};

/// Joins region bodies into the code unit
pub const REGION_SEPARATOR: &str = "\n";

pub(crate) const SCRIPT_OPEN: Marker = Marker::new(&[
    Piece::Lit("<script"),
    Piece::Boundary,
    Piece::Through(b'>'),
]);
pub(crate) const SCRIPT_CLOSE: Marker = Marker::new(&[Piece::Lit("</script>")]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub skeleton: MarkupSkeleton,
    /// Region bodies in document order, each trimmed
    pub regions: Vec<String>,
}

impl Extraction {
    pub fn code_unit(&self) -> CodeUnit {
        CodeUnit::new(self.regions.join(REGION_SEPARATOR))
    }
}

pub fn extract_regions(document: &str) -> Extraction {
    let scan = find_spans(document, &SCRIPT_OPEN, &SCRIPT_CLOSE);
    if let Some(offset) = scan.unmatched_open {
        warn!("Unterminated script tag at offset {offset} left in markup");
    }

    let regions: Vec<String> = scan
        .spans
        .iter()
        .map(|span| document[span.inner.clone()].trim().to_owned())
        .collect();

    if regions.is_empty() {
        info!("No script regions found, markup is passed through unchanged");
    } else {
        debug!("Extracted {} script region(s)", regions.len());
    }

    let outer: Vec<_> = scan.spans.into_iter().map(|span| span.outer).collect();
    Extraction {
        skeleton: MarkupSkeleton::new(remove_ranges(document, &outer)),
        regions,
    }
}
