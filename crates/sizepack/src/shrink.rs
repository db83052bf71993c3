//! Token shrinking
//!
//! Two fixed passes over the reassembled code unit, in order:
//! 1. whole-token renames from long semantic names to short symbols
//! 2. elision of empty-collection fields that are known to default
//!
//! Both passes only ever remove source patterns, so running the shrinker on its
//! own output changes nothing.

use indexmap::IndexMap;
use log::{debug, info, warn};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::{error::BuildError, tokens, types::CodeUnit};

/// A pattern removed or shortened wherever it appears
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Elision {
    pub pattern: String,
    pub replacement: String,
}

impl Elision {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShrinkRules {
    /// Long token → short token, applied in insertion order
    pub renames: IndexMap<String, String>,
    pub elisions: Vec<Elision>,
}

impl Default for ShrinkRules {
    fn default() -> Self {
        Self {
            renames: default_renames(),
            elisions: default_elisions(),
        }
    }
}

pub fn default_renames() -> IndexMap<String, String> {
    [
        ("numChannels", "E"),
        ("rowLen", "F"),
        ("patternLen", "G"),
        ("endPattern", "H"),
        ("songData", "s"),
    ]
    .into_iter()
    .map(|(long, short)| (long.to_owned(), short.to_owned()))
    .collect()
}

/// Empty effect arrays in song data default to nothing
pub fn default_elisions() -> Vec<Elision> {
    vec![Elision::new("f: []}", "}"), Elision::new("f: []},", "},")]
}

impl ShrinkRules {
    /// Reject tables that could corrupt tokens or break idempotence
    pub fn validate(&self) -> Result<(), BuildError> {
        let mut shorts = FxHashSet::default();
        for (long, short) in &self.renames {
            if long.is_empty() || short.is_empty() {
                return Err(BuildError::InvalidConfig(format!(
                    "rename `{long}` -> `{short}` has an empty side"
                )));
            }
            if !shorts.insert(short.as_str()) {
                return Err(BuildError::InvalidConfig(format!(
                    "short token `{short}` is used by more than one rename"
                )));
            }
            if let Some(other) = self.renames.keys().find(|other| short.contains(other.as_str())) {
                return Err(BuildError::InvalidConfig(format!(
                    "short token `{short}` contains renamed token `{other}`"
                )));
            }
        }
        if let Some(elision) = self
            .elisions
            .iter()
            .find(|elision| elision.pattern.is_empty() || elision.replacement.contains(&elision.pattern))
        {
            return Err(BuildError::InvalidConfig(format!(
                "elision `{}` -> `{}` would not shrink",
                elision.pattern, elision.replacement
            )));
        }
        Ok(())
    }
}

pub fn shrink(code: &CodeUnit, rules: &ShrinkRules) -> CodeUnit {
    let mut text = code.as_str().to_owned();

    for (long, short) in &rules.renames {
        let count = tokens::count_tokens(&text, long);
        if count == 0 {
            continue;
        }
        if tokens::count_tokens(&text, short) > 0 {
            warn!("Renaming `{long}` to `{short}`, which is already used in the script");
        }
        debug!("Renaming {count} occurrence(s) of `{long}` to `{short}`");
        text = tokens::replace_tokens(&text, long, short).into_owned();
    }

    for elision in &rules.elisions {
        let count = tokens::count_tokens(&text, &elision.pattern);
        if count > 0 {
            debug!(
                "Eliding {count} occurrence(s) of `{}` to `{}`",
                elision.pattern, elision.replacement
            );
            text = tokens::replace_tokens(&text, &elision.pattern, &elision.replacement).into_owned();
        }
    }

    info!("Shrunk script size: {} (was {})", text.len(), code.len());
    CodeUnit::new(text)
}
