//! Puts the optimized stylesheet into the page.
//!
//! Works on the raw markup rather than a re-serialized DOM so everything that is
//! not a stylesheet link or a `<style>` block comes out byte for byte.

/// `id` of the `<style>` element holding the optimized CSS.
pub const OPTIMIZED_STYLE_ID: &str = "blazecss-optimized-css";

/// Inline `<style>` blocks carrying this marker are left in place.
pub const NO_OPTIMIZE_MARKER: &str = "data-no-optimize";

/// Removes stylesheet links and unmarked `<style>` blocks, then inserts the
/// optimized CSS right before `</head>`. Without a `</head>` nothing is inserted.
pub fn replace_css_in_html(html: &str, optimized_css: &str) -> String {
    let html = remove_stylesheet_links(html);
    let html = remove_inline_styles(&html);

    let css_tag = format!(
        "<style id=\"{}\">{}</style>",
        OPTIMIZED_STYLE_ID,
        escape_style_text(optimized_css)
    );
    insert_before_head_close(&html, &css_tag)
}

/// Case-insensitive ASCII search for `needle` in `haystack`, starting at `from`.
fn find_ignore_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from + needle.len() > hay.len() {
        return None;
    }
    (from..=hay.len() - needle.len())
        .find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Finds the next `<name` tag open, i.e. `<name` followed by whitespace, `>` or `/`.
fn find_tag_open(html: &str, name: &str, from: usize) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut cursor = from;
    loop {
        let start = find_ignore_case(html, name, cursor)?;
        match bytes.get(start + name.len()) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(start),
            Some(_) => cursor = start + 1,
            None => return None,
        }
    }
}

/// Value of attribute `name` inside a single start tag, unquoted or quoted.
fn attribute_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let bytes = tag.as_bytes();
    let mut cursor = 0;
    while let Some(at) = find_ignore_case(tag, name, cursor) {
        cursor = at + 1;
        let preceded_by_space = at > 0 && bytes[at - 1].is_ascii_whitespace();
        let mut i = at + name.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if !preceded_by_space || bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        return match bytes.get(i) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let rest = &tag[i + 1..];
                rest.find(quote as char).map(|end| &rest[..end])
            }
            Some(_) => {
                let rest = &tag[i..];
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .unwrap_or(rest.len());
                Some(&rest[..end])
            }
            None => None,
        };
    }
    None
}

pub fn is_stylesheet_link(tag: &str) -> bool {
    attribute_value(tag, "rel").map_or(false, |rel| rel.trim().eq_ignore_ascii_case("stylesheet"))
}

/// Drops every `<link rel="stylesheet">` tag.
pub fn remove_stylesheet_links(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut cursor = 0;
    while let Some(start) = find_tag_open(html, "<link", cursor) {
        let Some(end) = html[start..].find('>').map(|offset| start + offset + 1) else {
            break;
        };
        if is_stylesheet_link(&html[start..end]) {
            out.push_str(&html[copied..start]);
            copied = end;
        }
        cursor = end;
    }
    out.push_str(&html[copied..]);
    out
}

/// Drops every `<style>...</style>` block unless it mentions `data-no-optimize`.
/// An unclosed `<style>` is left alone.
pub fn remove_inline_styles(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut cursor = 0;
    while let Some(start) = find_tag_open(html, "<style", cursor) {
        let Some(close) = find_ignore_case(html, "</style", start) else {
            break;
        };
        let Some(end) = html[close..].find('>').map(|offset| close + offset + 1) else {
            break;
        };
        if !html[start..end].contains(NO_OPTIMIZE_MARKER) {
            out.push_str(&html[copied..start]);
            copied = end;
        }
        cursor = end;
    }
    out.push_str(&html[copied..]);
    out
}

fn insert_before_head_close(html: &str, fragment: &str) -> String {
    match find_ignore_case(html, "</head>", 0) {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + fragment.len());
            out.push_str(&html[..at]);
            out.push_str(fragment);
            out.push_str(&html[at..]);
            out
        }
        None => html.to_string(),
    }
}

/// Keeps the CSS from closing its own `<style>` element early.
fn escape_style_text(css: &str) -> String {
    if find_ignore_case(css, "</style", 0).is_none() {
        return css.to_string();
    }
    let mut out = String::with_capacity(css.len() + 8);
    let mut copied = 0;
    while let Some(at) = find_ignore_case(css, "</style", copied) {
        out.push_str(&css[copied..at + 1]);
        out.push('\\');
        copied = at + 1;
    }
    out.push_str(&css[copied..]);
    out
}
