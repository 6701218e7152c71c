//! Responsive `@media` blocks are pulled out of the raw sources before any
//! filtering and re-filtered on their own afterwards.

use crate::style::blaze_css;
use crate::style::css_matcher::{Safelist, UsedSelectorSet};
use crate::style::owned_css::StyleSheetSource;
use crate::style::scanner::{BlockScanner, Segment};
use crate::style::transform;
use log::debug;

/// Conditions that mark a media block as a responsive breakpoint.
const RESPONSIVE_CONDITIONS: &[&str] = &["min-width", "max-width", "orientation"];

/// An `@media` block lifted from a source stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQueryBlock {
    /// Everything before the opening brace, verbatim, e.g. `@media (min-width: 768px)`.
    pub prelude: String,
    /// Text strictly inside the outer braces.
    pub inner: String,
}

impl MediaQueryBlock {
    pub fn is_responsive(&self) -> bool {
        RESPONSIVE_CONDITIONS
            .iter()
            .any(|condition| self.prelude.contains(condition))
    }

    /// Re-filters the inner rules. `None` when nothing inside survives.
    pub fn filter(&self, used: &UsedSelectorSet, safelist: &Safelist) -> Option<String> {
        let inner = blaze_css::filter(&transform::minify(&self.inner), used, safelist);
        if inner.is_empty() {
            return None;
        }
        Some(format!("{}{{{}}}", self.prelude, inner))
    }
}

/// `@media` followed by at least one character of conditions.
fn is_media_prelude(prelude: &str) -> bool {
    let bytes = prelude.as_bytes();
    bytes.len() > 6
        && bytes[..6].eq_ignore_ascii_case(b"@media")
        && (bytes[6].is_ascii_whitespace() || bytes[6] == b'(')
}

/// Top-level responsive media blocks of one stylesheet, in source order.
/// Blocks nested deeper than one level of rules are not captured.
pub fn extract_from(css: &str) -> Vec<MediaQueryBlock> {
    let mut blocks = Vec::new();
    for segment in BlockScanner::new(css) {
        let (prelude, body) = match segment {
            Segment::Rule { prelude, body, .. } => (prelude, body),
            Segment::Block {
                prelude,
                body,
                depth,
                ..
            } if depth <= 2 => (prelude, body),
            _ => continue,
        };
        if !is_media_prelude(prelude) {
            continue;
        }
        let block = MediaQueryBlock {
            prelude: prelude.to_string(),
            inner: body.to_string(),
        };
        if block.is_responsive() {
            blocks.push(block);
        } else {
            debug!("dropping non-responsive block `{}`", block.prelude);
        }
    }
    blocks
}

/// Responsive media blocks of every source, in source then document order.
pub fn extract(sources: &[StyleSheetSource]) -> Vec<MediaQueryBlock> {
    sources
        .iter()
        .flat_map(|source| extract_from(&source.content))
        .collect()
}

/// Re-filters each block and concatenates the survivors in extraction order.
pub fn reattach(blocks: &[MediaQueryBlock], used: &UsedSelectorSet, safelist: &Safelist) -> String {
    blocks
        .iter()
        .filter_map(|block| block.filter(used, safelist))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn used(tokens: &[&str]) -> UsedSelectorSet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_only_responsive_blocks_are_extracted() {
        let css = "
            .a { color: red }
            @media print { .a { color: black } }
            @media (min-width: 768px) { .a { color: blue } }
            @media screen and (orientation: landscape) { .b { x: y } }
            @MEDIA (max-width: 600px) { .c { x: y } }
        ";
        let blocks = extract_from(css);
        let preludes: Vec<&str> = blocks.iter().map(|b| b.prelude.as_str()).collect();
        assert_eq!(
            preludes,
            vec![
                "@media (min-width: 768px)",
                "@media screen and (orientation: landscape)",
                "@MEDIA (max-width: 600px)",
            ]
        );
        assert_eq!(blocks[0].inner, " .a { color: blue } ");
    }

    #[test]
    fn test_deeper_nesting_is_not_captured() {
        let css = "@media (min-width: 1px) { @supports (display: grid) { .a { x: y } } }";
        assert!(extract_from(css).is_empty());
    }

    #[test]
    fn test_extract_keeps_source_order() {
        let sources = vec![
            StyleSheetSource::new("a.css", "@media (min-width:1px){.one{x:y}}"),
            StyleSheetSource::new("b.css", "@media (max-width:2px){.two{x:y}}"),
        ];
        let blocks = extract(&sources);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].inner.contains(".one"));
        assert!(blocks[1].inner.contains(".two"));
    }

    #[test]
    fn test_reattach_filters_inner_rules() {
        let blocks = extract_from(
            "@media (min-width: 768px) { .used { color: red } .unused { color: blue } }",
        );
        let out = reattach(&blocks, &used(&[".used"]), &Safelist::empty());
        assert_eq!(out, "@media (min-width: 768px){.used{color:red}}");
    }

    #[test]
    fn test_reattach_drops_empty_blocks() {
        let blocks = extract_from(
            "@media (min-width: 768px) { .gone { x: y } } @media (max-width: 10px) { .kept { x: y } }",
        );
        let out = reattach(&blocks, &used(&[".kept"]), &Safelist::empty());
        assert_eq!(out, "@media (max-width: 10px){.kept{x:y}}");
    }

    #[test]
    fn test_reattach_uses_safelist() {
        let blocks = extract_from("@media (min-width: 1px) { .col-6 { width: 50% } }");
        let out = reattach(&blocks, &UsedSelectorSet::new(), &Safelist::new([".col-*"]));
        assert_eq!(out, "@media (min-width: 1px){.col-6{width:50%}}");
    }
}
