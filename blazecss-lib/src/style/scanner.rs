//! A small brace-depth scanner for raw stylesheet text.
//!
//! The scanner never builds a tree. It walks the input once, tracking whether it
//! is outside a rule, inside a selector/prelude, inside a block body, inside a
//! comment or inside a string literal, and yields top-level [`Segment`]s that
//! borrow from the input. Everything the CSS passes need (rule splitting, media
//! extraction, `@font-face` patching) is built on top of it.

use std::ops::Range;

/// One top-level piece of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `prelude{body}` where the body holds no nested braces.
    Rule {
        prelude: &'a str,
        body: &'a str,
        span: Range<usize>,
    },
    /// A block whose body contains nested braces (`@media`, `@supports`, `@keyframes`).
    /// `depth` is the deepest brace level seen, counting the block itself as 1.
    Block {
        prelude: &'a str,
        body: &'a str,
        depth: usize,
        span: Range<usize>,
    },
    /// A `;` terminated statement outside any block, e.g. `@import url(a.css);`.
    Statement { text: &'a str, span: Range<usize> },
    /// Text that cannot form a rule: a stray `}` or an unterminated tail.
    Malformed { span: Range<usize> },
}

impl<'a> Segment<'a> {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Segment::Rule { span, .. }
            | Segment::Block { span, .. }
            | Segment::Statement { span, .. }
            | Segment::Malformed { span } => span,
        }
    }
}

/// Iterator over the top-level segments of a stylesheet.
pub struct BlockScanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> BlockScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        BlockScanner { input, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn skip_whitespace_and_comments(&mut self) {
        let bytes = self.bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if starts_comment(bytes, self.pos) {
                self.pos = skip_comment(bytes, self.pos);
            } else {
                break;
            }
        }
    }

    /// Scans a block body starting right after its opening brace.
    /// Returns the index of the matching `}` and the deepest level reached.
    fn scan_body(&self, open: usize) -> Option<(usize, usize)> {
        let bytes = self.bytes();
        let mut depth = 1;
        let mut max_depth = 1;
        let mut i = open + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'"' | b'\'' => {
                    i = skip_string(bytes, i);
                    continue;
                }
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'/' if starts_comment(bytes, i) => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b'{' => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                }
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((i, max_depth));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }
}

impl<'a> Iterator for BlockScanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        self.skip_whitespace_and_comments();
        let bytes = self.bytes();
        let len = bytes.len();
        if self.pos >= len {
            return None;
        }

        let start = self.pos;
        let mut parens = 0usize;
        let mut i = start;
        // in-selector
        let open = loop {
            if i >= len {
                self.pos = len;
                return Some(Segment::Malformed { span: start..len });
            }
            match bytes[i] {
                b'"' | b'\'' => {
                    i = skip_string(bytes, i);
                    continue;
                }
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'/' if starts_comment(bytes, i) => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b'(' => parens += 1,
                b')' => parens = parens.saturating_sub(1),
                b';' if parens == 0 => {
                    self.pos = i + 1;
                    return Some(Segment::Statement {
                        text: self.input[start..i].trim(),
                        span: start..i + 1,
                    });
                }
                b'{' => break i,
                b'}' => {
                    self.pos = i + 1;
                    return Some(Segment::Malformed { span: start..i + 1 });
                }
                _ => {}
            }
            i += 1;
        };

        // in-body
        let Some((close, depth)) = self.scan_body(open) else {
            self.pos = len;
            return Some(Segment::Malformed { span: start..len });
        };
        self.pos = close + 1;

        let prelude = self.input[start..open].trim();
        let body = &self.input[open + 1..close];
        let span = start..close + 1;
        if depth == 1 {
            Some(Segment::Rule {
                prelude,
                body,
                span,
            })
        } else {
            Some(Segment::Block {
                prelude,
                body,
                depth,
                span,
            })
        }
    }
}

pub(crate) fn starts_comment(bytes: &[u8], i: usize) -> bool {
    bytes.get(i) == Some(&b'/') && bytes.get(i + 1) == Some(&b'*')
}

/// Returns the index just past the `*/` closing the comment at `i`, or the input
/// length for an unterminated comment.
pub(crate) fn skip_comment(bytes: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while j + 1 < bytes.len() {
        if bytes[j] == b'*' && bytes[j + 1] == b'/' {
            return j + 2;
        }
        j += 1;
    }
    bytes.len()
}

/// Returns the index just past the string literal opening at `i`.
/// Backslash escapes are honoured; an unterminated string runs to the end.
pub(crate) fn skip_string(bytes: &[u8], i: usize) -> usize {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// Splits a selector list on commas that are not inside parentheses,
/// brackets or strings. Each piece is trimmed.
pub fn split_selectors(selector_list: &str) -> Vec<&str> {
    let bytes = selector_list.as_bytes();
    let mut pieces = Vec::new();
    let mut nesting = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'\\' => {
                i += 2;
                continue;
            }
            b'(' | b'[' => nesting += 1,
            b')' | b']' => nesting = nesting.saturating_sub(1),
            b',' if nesting == 0 => {
                pieces.push(selector_list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    pieces.push(selector_list[start.min(bytes.len())..].trim());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(css: &str) -> Vec<Segment<'_>> {
        BlockScanner::new(css).collect()
    }

    #[test]
    fn test_flat_rules() {
        let segments = collect(".a{color:red}.b , .c{margin:0}");
        assert_eq!(segments.len(), 2);
        match &segments[1] {
            Segment::Rule { prelude, body, .. } => {
                assert_eq!(*prelude, ".b , .c");
                assert_eq!(*body, "margin:0");
            }
            other => panic!("unexpected segment {:?}", other),
        }
    }

    #[test]
    fn test_nested_block_depth() {
        let css = "@media (min-width:1px){.a{color:red}}.b{x:y}";
        let segments = collect(css);
        match &segments[0] {
            Segment::Block {
                prelude,
                depth,
                span,
                ..
            } => {
                assert_eq!(*prelude, "@media (min-width:1px)");
                assert_eq!(*depth, 2);
                assert_eq!(&css[span.clone()], "@media (min-width:1px){.a{color:red}}");
            }
            other => panic!("unexpected segment {:?}", other),
        }
        assert!(matches!(segments[1], Segment::Rule { .. }));
    }

    #[test]
    fn test_braces_inside_strings_and_comments() {
        let segments = collect(r#".a{content:"}{"}/* } */.b{x:'{'}"#);
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| matches!(s, Segment::Rule { .. })));
    }

    #[test]
    fn test_statements_and_stray_braces() {
        let segments = collect("@charset \"utf-8\";}.a{b:c}");
        assert!(matches!(segments[0], Segment::Statement { text: "@charset \"utf-8\"", .. }));
        assert!(matches!(segments[1], Segment::Malformed { .. }));
        assert!(matches!(segments[2], Segment::Rule { prelude: ".a", .. }));
    }

    #[test]
    fn test_unterminated_block_is_malformed() {
        let segments = collect(".a{b:c}.d{e:f");
        assert_eq!(segments.len(), 2);
        assert!(matches!(segments[1], Segment::Malformed { .. }));
    }

    #[test]
    fn test_split_selectors_respects_parens() {
        assert_eq!(
            split_selectors(":is(.a, .b) > p, .c ,[data-x=\"1,2\"]"),
            vec![":is(.a, .b) > p", ".c", "[data-x=\"1,2\"]"]
        );
    }
}
