//! Shader dimension placeholder normalization
//!
//! The shader text carries run-time template symbols such as `${w}` that no
//! shader minifier accepts. Before minification every symbol is swapped for a
//! numeric stand-in, and afterwards every stand-in is swapped back. All
//! occurrences are replaced in both directions.

use cow_utils::CowUtils;
use indexmap::IndexMap;
use log::{debug, warn};

use crate::{tokens, types::ShaderUnit};

/// Ordered symbol → stand-in table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: IndexMap<String, String>,
}

impl Default for PlaceholderMap {
    fn default() -> Self {
        Self {
            entries: default_placeholders(),
        }
    }
}

/// Canvas width and height, as interpolated into the shader template
pub fn default_placeholders() -> IndexMap<String, String> {
    [("${w}", "436"), ("${h}", "258")]
        .into_iter()
        .map(|(symbol, stand_in)| (symbol.to_owned(), stand_in.to_owned()))
        .collect()
}

impl PlaceholderMap {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, S)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(symbol, stand_in)| (symbol.into(), stand_in.into()))
                .collect(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(symbol, stand_in)| (symbol.as_str(), stand_in.as_str()))
    }

    /// Replace every symbol with its stand-in
    pub fn normalize(&self, shader: &ShaderUnit) -> ShaderUnit {
        let mut text = shader.as_str().to_owned();
        for (symbol, stand_in) in self.entries() {
            if tokens::count_tokens(&text, stand_in) > 0 {
                warn!(
                    "Shader already contains stand-in `{stand_in}` for `{symbol}`; it will be \
                     turned into `{symbol}` after minification"
                );
            }
            let count = text.matches(symbol).count();
            debug!("Normalizing {count} occurrence(s) of `{symbol}` to `{stand_in}`");
            text = text.cow_replace(symbol, stand_in).into_owned();
        }
        ShaderUnit::new(text)
    }

    /// Replace every whole stand-in token in minified output with its symbol
    pub fn denormalize(&self, minified: &str) -> String {
        let mut text = minified.to_owned();
        for (symbol, stand_in) in self.entries() {
            text = tokens::replace_tokens(&text, stand_in, symbol).into_owned();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_replaces_every_occurrence() {
        let map = PlaceholderMap::default();
        let shader = ShaderUnit::new("vec2 r=vec2(${w},${h});float a=${w}./${h}.;");
        let normalized = map.normalize(&shader);
        assert_eq!(
            normalized.as_str(),
            "vec2 r=vec2(436,258);float a=436./258.;"
        );
    }

    #[test]
    fn test_round_trip_is_exact() {
        let map = PlaceholderMap::default();
        let shader = ShaderUnit::new("uniform float t;\nvoid main(){vec2 p=gl_FragCoord.xy/vec2(${w},${h});p.x*=${w}/${h};}");
        let normalized = map.normalize(&shader);
        assert!(!normalized.as_str().contains("${"));
        assert_eq!(map.denormalize(normalized.as_str()), shader.as_str());
    }

    #[test]
    fn test_denormalize_leaves_longer_numbers_alone() {
        let map = PlaceholderMap::default();
        assert_eq!(map.denormalize("x=4360.+436.;y=1258;"), "x=4360.+${w}.;y=1258;");
    }

    #[test]
    fn test_custom_table_order_is_kept() {
        let map = PlaceholderMap::new([("${h}", "7"), ("${w}", "9")]);
        let symbols: Vec<_> = map.entries().map(|(symbol, _)| symbol).collect();
        assert_eq!(symbols, vec!["${h}", "${w}"]);
    }
}
