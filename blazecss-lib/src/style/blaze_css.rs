use crate::style::css_matcher::{is_used, Safelist, UsedSelectorSet};
use crate::style::scanner::{split_selectors, BlockScanner, Segment};

/// Flat at-rules that are kept whatever the document uses.
const PRESERVED_AT_RULES: &[&str] = &["@font-face"];

/// Keeps the rules of an already minified stylesheet that the document needs.
///
/// Rules are emitted in source order as `selectors{body}` with both parts copied
/// verbatim. Nested blocks (`@media`, `@supports`, `@keyframes`), statement
/// at-rules and malformed rules are skipped; responsive media blocks are put
/// back separately by [`crate::style::media::reattach`].
pub fn filter(css_text: &str, used_selectors: &UsedSelectorSet, safelist: &Safelist) -> String {
    let mut processed_css = String::with_capacity(css_text.len() / 2);

    for segment in BlockScanner::new(css_text) {
        if let Segment::Rule { prelude, body, .. } = segment {
            if keep_rule(prelude, used_selectors, safelist) {
                processed_css.push_str(prelude);
                processed_css.push('{');
                processed_css.push_str(body);
                processed_css.push('}');
            }
        }
    }
    processed_css
}

/// True if any selector of the list is allow-listed or used.
/// A rule is atomic: one qualifying selector keeps the whole list and body.
pub fn keep_rule(selector_list: &str, used_selectors: &UsedSelectorSet, safelist: &Safelist) -> bool {
    if PRESERVED_AT_RULES
        .iter()
        .any(|at_rule| selector_list.eq_ignore_ascii_case(at_rule))
    {
        return true;
    }

    split_selectors(selector_list)
        .into_iter()
        .filter(|selector| !selector.is_empty())
        .any(|selector| {
            safelist.is_allow_listed(selector) || is_used(selector, used_selectors)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn used(tokens: &[&str]) -> UsedSelectorSet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_keeps_used_and_drops_unused() {
        let out = filter(
            ".foo{color:red}.bar{color:blue}",
            &used(&["foo"]),
            &Safelist::empty(),
        );
        assert_eq!(out, ".foo{color:red}");
    }

    #[test]
    fn test_rules_are_atomic() {
        let out = filter(
            ".keep,.drop{color:blue;margin:0}.drop{x:y}",
            &used(&[".keep"]),
            &Safelist::empty(),
        );
        assert_eq!(out, ".keep,.drop{color:blue;margin:0}");
    }

    #[test]
    fn test_source_order_preserved() {
        let out = filter(
            "p{a:b}.x{c:d}div{e:f}.y{g:h}",
            &used(&["div", "p"]),
            &Safelist::empty(),
        );
        assert_eq!(out, "p{a:b}div{e:f}");
    }

    #[test]
    fn test_safelisted_rule_kept_without_usage() {
        let out = filter(
            ".modal{z-index:10}.tooltip{z-index:20}.js-x{a:b}.col-6{c:d}",
            &UsedSelectorSet::new(),
            &Safelist::new([".modal", ".js-*", "col-*"]),
        );
        assert_eq!(out, ".modal{z-index:10}.js-x{a:b}");
    }

    #[test]
    fn test_pseudo_selectors_follow_base_selector() {
        let out = filter(
            ".btn-x:hover{a:b}.link:visited{c:d}",
            &used(&[".btn-x"]),
            &Safelist::empty(),
        );
        assert_eq!(out, ".btn-x:hover{a:b}");
    }

    #[test]
    fn test_font_face_always_kept() {
        let out = filter(
            "@font-face{font-family:X;src:url(x.woff)}.z{a:b}",
            &UsedSelectorSet::new(),
            &Safelist::empty(),
        );
        assert_eq!(out, "@font-face{font-family:X;src:url(x.woff)}");
    }

    #[test]
    fn test_nested_blocks_and_statements_skipped() {
        let out = filter(
            "@import url(a.css);@media (min-width:1px){.a{b:c}}@keyframes spin{from{x:0}to{x:1}}.a{b:c}",
            &used(&[".a", "to"]),
            &Safelist::empty(),
        );
        assert_eq!(out, ".a{b:c}");
    }

    #[test]
    fn test_malformed_rules_skipped_silently() {
        let out = filter(
            "}.a{b:c}{x:y},{z:w}.b{c:d",
            &used(&[".a", ".b"]),
            &Safelist::empty(),
        );
        assert_eq!(out, ".a{b:c}");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(filter("", &used(&["a"]), &Safelist::default()), "");
    }
}
