//! Shader isolation and reinsertion
//!
//! Shader source lives in the script between an opening `/*--` and a closing
//! `//*--` (or `//--`). Isolation cuts every span out of the code unit and
//! leaves the surrounding quoted placeholder behind, e.g.
//!
//! ```text
//! const fs = `/*--
//! void main() { ... }
//! //*--/`;
//! ```
//!
//! leaves ``const fs = `/`;`` in the code unit. After the shader is minified
//! it is spliced back in at that placeholder using the placeholder's own
//! quote characters.

use anyhow::Result;
use log::{debug, info, warn};

use crate::{
    error::BuildError,
    scanner::{Marker, Piece, find_spans, remove_ranges},
    types::{CodeUnit, ShaderUnit},
};

const SHADER_OPEN: Marker = Marker::new(&[Piece::Lit("/*--"), Piece::NotFollowedBy(b'-')]);
const SHADER_CLOSE: Marker = Marker::new(&[
    Piece::OneOf(&["//*", "//"]),
    Piece::Lit("--"),
    Piece::NotFollowedBy(b'-'),
]);

/// Separator between shader spans in the shader unit
pub const SHADER_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedShader {
    /// Code unit with every shader span removed
    pub code: CodeUnit,
    /// `None` when the script has no shader spans
    pub shader: Option<ShaderUnit>,
}

/// Cut all shader spans out of `code`.
///
/// When spans are found the remaining code must contain `placeholder`
/// exactly once, so that reinsertion has a single, unambiguous target. This
/// is checked here, before any external tool runs.
pub fn isolate_shader(code: &CodeUnit, placeholder: &str) -> Result<IsolatedShader> {
    let text = code.as_str();
    let scan = find_spans(text, &SHADER_OPEN, &SHADER_CLOSE);
    if let Some(offset) = scan.unmatched_open {
        warn!("Shader marker at offset {offset} has no closing marker, leaving it in place");
    }

    if scan.spans.is_empty() {
        info!("No shader spans found, skipping shader minification");
        return Ok(IsolatedShader {
            code: code.clone(),
            shader: None,
        });
    }

    let bodies: Vec<&str> = scan
        .spans
        .iter()
        .map(|span| text[span.inner.clone()].trim())
        .collect();
    let shader = ShaderUnit::new(bodies.join(SHADER_SEPARATOR));
    debug!("Isolated {} shader span(s)", bodies.len());
    info!("Extracted shader size: {}", shader.len());

    let outer: Vec<_> = scan.spans.iter().map(|span| span.outer.clone()).collect();
    let remaining = CodeUnit::new(remove_ranges(text, &outer));
    ensure_single_placeholder(&remaining, placeholder)?;

    Ok(IsolatedShader {
        code: remaining,
        shader: Some(shader),
    })
}

/// Replace the single `placeholder` in `code` with `minified` quoted the same way
pub fn reinsert_shader(code: &CodeUnit, placeholder: &str, minified: &str) -> Result<CodeUnit> {
    ensure_single_placeholder(code, placeholder)?;
    let literal = quote_like(placeholder, minified);
    Ok(CodeUnit::new(code.as_str().replacen(placeholder, &literal, 1)))
}

fn ensure_single_placeholder(code: &CodeUnit, placeholder: &str) -> Result<()> {
    let found = code.as_str().matches(placeholder).count();
    if found == 1 {
        Ok(())
    } else {
        Err(BuildError::PlaceholderCount {
            placeholder: placeholder.to_owned(),
            found,
        }
        .into())
    }
}

/// Wrap `body` in the first and last characters of `placeholder`
fn quote_like(placeholder: &str, body: &str) -> String {
    let mut chars = placeholder.chars();
    let open = chars.next().unwrap_or('`');
    let close = chars.next_back().unwrap_or(open);
    format!("{open}{body}{close}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PLACEHOLDER: &str = "`/`";

    fn isolate(text: &str) -> Result<IsolatedShader> {
        isolate_shader(&CodeUnit::new(text), PLACEHOLDER)
    }

    #[test]
    fn test_isolates_single_span() {
        let isolated = isolate("let s=`/*--\nvoid main(){}\n//--/`;go(s)").unwrap();
        assert_eq!(isolated.shader.unwrap().as_str(), "void main(){}");
        assert_eq!(isolated.code.as_str(), "let s=`/`;go(s)");
    }

    #[test]
    fn test_isolates_star_close_marker() {
        let isolated = isolate("f(`/*--\n  uniform float t;\n  void main(){}\n//*--/`)").unwrap();
        assert_eq!(
            isolated.shader.unwrap().as_str(),
            "uniform float t;\n  void main(){}"
        );
        assert_eq!(isolated.code.as_str(), "f(`/`)");
    }

    #[test]
    fn test_multiple_spans_are_joined_by_line_break() {
        let code = "a=`/*--\nfloat x;\n//*--/`;\n/*-- void main(){} //*--";
        let isolated = isolate(code).unwrap();
        assert_eq!(
            isolated.shader.unwrap().as_str(),
            "float x;\nvoid main(){}"
        );
        assert_eq!(isolated.code.as_str(), "a=`/`;\n");
    }

    #[test]
    fn test_no_spans_skips_shader() {
        let isolated = isolate("let a=1;//----- section\n").unwrap();
        assert_eq!(isolated.shader, None);
        assert_eq!(isolated.code.as_str(), "let a=1;//----- section\n");
    }

    #[test]
    fn test_line_comment_does_not_open_a_span() {
        let isolated =
            isolate("//-- init\nlet a=1;\nconst fs=`/*--\nvoid main(){}\n//*--/`;\ngo(fs);").unwrap();
        assert_eq!(isolated.shader.unwrap().as_str(), "void main(){}");
        assert_eq!(
            isolated.code.as_str(),
            "//-- init\nlet a=1;\nconst fs=`/`;\ngo(fs);"
        );
    }

    #[test]
    fn test_unclosed_marker_is_left_in_place() {
        let isolated = isolate("let a=1;/*-- never closed\nlet b=2;").unwrap();
        assert_eq!(isolated.shader, None);
        assert_eq!(isolated.code.as_str(), "let a=1;/*-- never closed\nlet b=2;");
    }

    #[test]
    fn test_missing_placeholder_is_structural_error() {
        let err = isolate("x=\"/*--\nvoid main(){}\n//--\"").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::PlaceholderCount { found: 0, .. })
        ));
    }

    #[test]
    fn test_duplicate_placeholder_is_structural_error() {
        let err = isolate("x=`/*--\nvoid main(){}\n//--/`;y=`/`").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::PlaceholderCount { found: 2, .. })
        ));
    }

    #[test]
    fn test_reinsert_wraps_in_placeholder_quotes() {
        let code = CodeUnit::new("let s=`/`;go(s)");
        let rebuilt = reinsert_shader(&code, PLACEHOLDER, "void main(){gl_FragColor=vec4(1);}").unwrap();
        assert_eq!(
            rebuilt.as_str(),
            "let s=`void main(){gl_FragColor=vec4(1);}`;go(s)"
        );
    }

    #[test]
    fn test_reinsert_with_custom_placeholder() {
        let code = CodeUnit::new("s='@@';");
        let rebuilt = reinsert_shader(&code, "'@@'", "x").unwrap();
        assert_eq!(rebuilt.as_str(), "s='x';");
    }
}
