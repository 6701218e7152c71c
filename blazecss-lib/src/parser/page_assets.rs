use crate::dom::dom_tree::{Document, ElementNode, Handle, Node};
use crate::parser::blaze_html;
use crate::style::css_matcher::UsedSelectorSet;

/// What the optimizer needs to know about a page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageAssets {
    /// `href`s of `<link rel="stylesheet">` elements, in document order.
    pub stylesheet_urls: Vec<String>,
    /// Tag names, `.class` and `#id` tokens found outside `<head>`.
    pub used_selectors: UsedSelectorSet,
    /// `href` of the first `<base>` element.
    pub base_href: Option<String>,
}

impl PageAssets {
    /// Walk the whole document once and collect links and used selectors.
    pub fn build(document: &Document) -> Self {
        let mut assets = PageAssets::default();
        Self::traverse(&document.root, &mut assets, false);
        assets
    }

    fn traverse(node: &Handle, assets: &mut PageAssets, in_head: bool) {
        match &*node.borrow() {
            Node::DocumentRoot(root) => {
                for child in &root.children {
                    Self::traverse(child, assets, in_head);
                }
            }
            Node::Element(elem) => {
                let in_head = in_head || elem.tag == "head";
                assets.record(elem, in_head);
                for child in &elem.children {
                    Self::traverse(child, assets, in_head);
                }
            }
            Node::Text(_) | Node::Comment(_) => {}
        }
    }

    fn record(&mut self, elem: &ElementNode, in_head: bool) {
        match elem.tag.as_str() {
            "link" if is_stylesheet(elem) => {
                if let Some(href) = elem.attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                    self.stylesheet_urls.push(href.to_string());
                }
            }
            "base" if self.base_href.is_none() => {
                self.base_href = elem.attr("href").map(|href| href.trim().to_string());
            }
            _ => {}
        }
        if in_head {
            return;
        }

        self.used_selectors.insert(elem.tag.clone());
        if let Some(id) = elem.attr("id").map(str::trim).filter(|id| !id.is_empty()) {
            self.used_selectors.insert(format!("#{}", id));
        }
        for class in elem.classes() {
            self.used_selectors.insert(format!(".{}", class));
        }
    }
}

fn is_stylesheet(elem: &ElementNode) -> bool {
    elem.attr("rel")
        .map_or(false, |rel| rel.trim().eq_ignore_ascii_case("stylesheet"))
}

/// Source of stylesheet URLs and used selectors for a page.
pub trait HtmlAnalyzer: Send + Sync {
    fn analyze(&self, html: &str) -> PageAssets;
}

/// Parses the page with html5ever and walks the resulting tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html5everAnalyzer;

impl HtmlAnalyzer for Html5everAnalyzer {
    fn analyze(&self, html: &str) -> PageAssets {
        let document = blaze_html::create_dom_tree(html);
        PageAssets::build(&document)
    }
}
