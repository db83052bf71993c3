//! Final document assembly

use crate::{
    packer::PackedArtifact,
    types::{FinalDocument, MarkupSkeleton},
};

pub const SCRIPT_OPEN_TAG: &str = "<script>";
pub const SCRIPT_CLOSE_TAG: &str = "</script>";

/// Append one script region holding both decoder parts to the skeleton
pub fn assemble(skeleton: &MarkupSkeleton, packed: &PackedArtifact) -> FinalDocument {
    let mut document = String::with_capacity(
        skeleton.len() + SCRIPT_OPEN_TAG.len() + packed.len() + SCRIPT_CLOSE_TAG.len(),
    );
    document.push_str(skeleton.as_str());
    document.push_str(SCRIPT_OPEN_TAG);
    document.push_str(&packed.first_line);
    document.push_str(&packed.second_line);
    document.push_str(SCRIPT_CLOSE_TAG);
    FinalDocument::new(document)
}
