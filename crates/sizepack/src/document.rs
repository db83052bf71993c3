//! Input document handling and output path derivation

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;

use crate::error::BuildError;

/// Suffix appended to the document stem to name the build output
pub const BUILD_SUFFIX: &str = "-build";

/// Immutable raw text of the input document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: PathBuf,
    text: String,
}

impl SourceDocument {
    /// Read the document once; a missing path is a usage error
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BuildError::InputNotFound(path.to_path_buf()).into());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        info!("Original document size: {}", text.len());
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// File name up to its first `.`
    pub fn stem(&self) -> String {
        document_stem(&self.path)
    }

    pub fn output_path(&self) -> PathBuf {
        derive_output_path(&self.path)
    }
}

fn document_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once('.') {
        Some((stem, _)) => stem.to_owned(),
        None => file_name,
    }
}

/// `demo.html` becomes `demo-build.html` next to the input.
///
/// Everything after the first `.` of the file name is replaced, so
/// `demo.dev.html` also becomes `demo-build.html`. A name without an
/// extension just gets the suffix.
pub fn derive_output_path(input: &Path) -> PathBuf {
    let stem = document_stem(input);
    let file_name = match input.extension() {
        Some(ext) => format!("{stem}{BUILD_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{BUILD_SUFFIX}"),
    };
    input.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_replaces_everything_after_first_dot() {
        assert_eq!(
            derive_output_path(Path::new("demos/intro.html")),
            PathBuf::from("demos/intro-build.html")
        );
        assert_eq!(
            derive_output_path(Path::new("intro.dev.html")),
            PathBuf::from("intro-build.html")
        );
        assert_eq!(
            derive_output_path(Path::new("./intro.htm")),
            PathBuf::from("./intro-build.htm")
        );
    }

    #[test]
    fn test_output_path_without_extension() {
        assert_eq!(
            derive_output_path(Path::new("intro")),
            PathBuf::from("intro-build")
        );
    }

    #[test]
    fn test_missing_document_is_usage_error() {
        let err = SourceDocument::read(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_stem() {
        let doc = SourceDocument::from_text("a/b/song.player.html", "");
        assert_eq!(doc.stem(), "song");
    }
}
