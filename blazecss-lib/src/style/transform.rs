//! Stateless text passes over stylesheet text: minification and the
//! `font-display: swap` patch.

use crate::config::MinifyMode;
use crate::error::OptimizeError;
use crate::style::scanner::{self, BlockScanner, Segment};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

/// No whitespace is needed after these.
const TIGHT_AFTER: &[u8] = b"{};,:>(";
/// No whitespace is needed before these.
const TIGHT_BEFORE: &[u8] = b"{};,>)";

/// Strips comments and redundant whitespace.
///
/// String literals and backslash escapes are copied untouched, so
/// `content:"/* x */"` survives. Running it twice gives the same text.
pub fn minify(css: &str) -> String {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if scanner::starts_comment(bytes, i) {
            i = scanner::skip_comment(bytes, i);
            // `/` + `*` left behind must not turn into a new comment opener
            if out.ends_with('/') && bytes.get(i) == Some(&b'*') {
                pending_space = true;
            }
            continue;
        }
        if b.is_ascii_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }

        let end = match b {
            b'"' | b'\'' => scanner::skip_string(bytes, i),
            b'\\' => next_char_boundary(css, (i + 1).min(bytes.len())),
            _ => next_char_boundary(css, i),
        };
        if pending_space {
            let last = out.as_bytes().last().copied();
            if let Some(last) = last {
                if !TIGHT_AFTER.contains(&last) && !TIGHT_BEFORE.contains(&b) {
                    out.push(' ');
                }
            }
            pending_space = false;
        }
        out.push_str(&css[i..end]);
        i = end;
    }
    out
}

/// Index of the end of the character starting at `i`.
fn next_char_boundary(s: &str, i: usize) -> usize {
    s[i..].chars().next().map_or(s.len(), |c| i + c.len_utf8())
}

/// Full minification through lightningcss, then the whitespace pass.
fn minify_lightning(css: &str) -> Result<String, OptimizeError> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| OptimizeError::Minify(e.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| OptimizeError::Minify(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| OptimizeError::Minify(e.to_string()))?;
    Ok(minify(&printed.code))
}

/// Minifies with the selected mode. Only [`MinifyMode::Lightning`] can fail.
pub fn minify_with(mode: MinifyMode, css: &str) -> Result<String, OptimizeError> {
    match mode {
        MinifyMode::Whitespace => Ok(minify(css)),
        MinifyMode::Lightning => minify_lightning(css),
    }
}

/// Adds `font-display:swap;` to every `@font-face` block that does not mention
/// `font-display` yet, including the ones inside `@media` and other nested blocks.
pub fn apply_font_display_swap(css: &str) -> String {
    let mut out = String::with_capacity(css.len() + 64);
    let mut copied = 0;

    for segment in BlockScanner::new(css) {
        match segment {
            Segment::Rule {
                prelude,
                body,
                span,
            } => {
                if !prelude.eq_ignore_ascii_case("@font-face") || body.contains("font-display") {
                    continue;
                }
                let close = span.end - 1;
                out.push_str(&css[copied..close]);
                let last_decl = body.trim_end();
                if !last_decl.is_empty() && !last_decl.ends_with(';') {
                    out.push(';');
                }
                out.push_str("font-display:swap;");
                copied = close;
            }
            Segment::Block { body, span, .. } => {
                let close = span.end - 1;
                let body_start = close - body.len();
                out.push_str(&css[copied..body_start]);
                out.push_str(&apply_font_display_swap(body));
                copied = close;
            }
            Segment::Statement { .. } | Segment::Malformed { .. } => {}
        }
    }
    out.push_str(&css[copied..]);
    out
}
