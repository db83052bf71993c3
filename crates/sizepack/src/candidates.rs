//! Candidate minification and selection
//!
//! Every configured minifier runs on the same shrunk script, concurrently,
//! and the shortest result wins. Ties go to the minifier listed first. Any
//! single failure fails the build.

use std::thread;

use anyhow::{Result, anyhow};
use log::info;

use crate::{error::BuildError, tools::CodeMinifier, types::CodeUnit};

/// One minifier's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub minifier: String,
    pub code: String,
}

impl Candidate {
    pub fn new(minifier: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            minifier: minifier.into(),
            code: code.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// Run all minifiers in parallel; results keep the minifiers' priority order
pub fn minify_candidates(
    code: &CodeUnit,
    minifiers: &[Box<dyn CodeMinifier>],
) -> Result<Vec<Candidate>> {
    let input = code.as_str();

    let results: Vec<Result<Candidate>> = thread::scope(|scope| {
        let handles: Vec<_> = minifiers
            .iter()
            .map(|minifier| {
                scope.spawn(move || {
                    minifier
                        .minify(input)
                        .map(|minified| Candidate::new(minifier.name(), minified))
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(minifiers)
            .map(|(handle, minifier)| {
                handle.join().unwrap_or_else(|_| {
                    Err(anyhow!(BuildError::external(minifier.name(), "minifier thread panicked")))
                })
            })
            .collect()
    });

    let candidates = results.into_iter().collect::<Result<Vec<_>>>()?;
    let lengths: Vec<String> = candidates
        .iter()
        .map(|candidate| format!("{}: {}", candidate.minifier, candidate.len()))
        .collect();
    info!("Candidates {}", lengths.join(" vs "));
    Ok(candidates)
}

/// Strictly shortest candidate, first one on ties
pub fn select_smallest(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().min_by_key(Candidate::len)
}
