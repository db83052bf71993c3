//! Error taxonomy for a build
//!
//! Every failure is fatal to the build invocation. The variants name the class
//! of failure so the CLI and tests can tell them apart after they have been
//! propagated through `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// No input document was named on the command line
    #[error("please provide the document path as an argument")]
    MissingInput,

    /// The named input document does not exist
    #[error("the provided document does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The code unit does not contain exactly one shader reinsertion point
    #[error("expected exactly one shader placeholder `{placeholder}` in the script, found {found}")]
    PlaceholderCount { placeholder: String, found: usize },

    /// The configuration cannot produce a safe build
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An external minifier or the packer failed
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },
}

impl BuildError {
    pub fn external(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
