//! This module contains functions and types for parsing HTML into a custom DOM tree.
//!
//! It uses html5ever as the HTML parser and builds a DOM tree defined in the
//! `crate::dom::dom_tree` module. The tree is only read to find stylesheet links
//! and the selectors a page uses, so nodes keep just what that needs.

use crate::dom::dom_tree::{self, Handle, Node};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use log::debug;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Creates a DOM tree from the provided HTML content.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
///
/// # Returns
///
/// A `dom_tree::Document` representing the parsed HTML.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = BlazeTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content)
}

/// A custom TreeSink for building the DOM tree used by the parser.
pub struct BlazeTreeSink {
    document: dom_tree::Document,
}

impl BlazeTreeSink {
    /// Creates a new `BlazeTreeSink` with an empty document.
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
        }
    }
}

impl Default for BlazeTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple implementation of the `ElemName` trait for our elements.
#[derive(Debug)]
pub struct BlazeElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for BlazeElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

fn parent_of(node: &Handle) -> Option<Handle> {
    match &*node.borrow() {
        Node::Element(elem) => elem.parent.as_ref().and_then(|weak| weak.upgrade()),
        _ => None,
    }
}

fn set_parent(node: &Handle, parent: &Handle) {
    if let Node::Element(ref mut elem) = *node.borrow_mut() {
        elem.parent = Some(Rc::downgrade(parent));
    }
}

/// Turns `NodeOrText` into a node, merging text into the last text node of
/// `children` when possible. Returns `None` if the text was merged.
fn into_node(children: &[Handle], child: NodeOrText<Handle>) -> Option<Handle> {
    match child {
        NodeOrText::AppendNode(node) => Some(node),
        NodeOrText::AppendText(text) => {
            if let Some(last) = children.last() {
                if let Node::Text(ref mut existing) = *last.borrow_mut() {
                    existing.push_str(&text);
                    return None;
                }
            }
            Some(Rc::new(RefCell::new(Node::Text(text.to_string()))))
        }
    }
}

impl TreeSink for BlazeTreeSink {
    type Handle = Handle;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = BlazeElemName
    where
        Self: 'a;

    /// Finalizes and returns the constructed Document.
    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        debug!("HTML parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    /// Returns the element name for the given handle; non-elements get an empty name.
    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            Node::Element(elem) => BlazeElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            _ => BlazeElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let mut element = dom_tree::ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        Rc::new(RefCell::new(Node::Element(element)))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(text.to_string())))
    }

    /// Processing instructions carry nothing we read; keep them as comments.
    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(format!("{} {}", target, data))))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let new_node = {
            let parent_ref = parent.borrow();
            let Some(children) = parent_ref.children() else {
                return;
            };
            into_node(children, child)
        };
        if let Some(node) = new_node {
            set_parent(&node, parent);
            if let Some(children) = parent.borrow_mut().children_mut() {
                children.push(node);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(name.to_string());
    }

    /// Template contents live inline with the template element.
    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    /// Logged only; page analysis reads the same tokens in every mode.
    fn set_quirks_mode(&self, mode: QuirksMode) {
        debug!("HTML quirks mode: {:?}", mode);
    }

    /// Inserts a node right before `sibling` (used for foster parenting).
    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let Some(parent) = parent_of(sibling) else {
            return;
        };
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => Rc::new(RefCell::new(Node::Text(text.to_string()))),
        };
        set_parent(&node, &parent);
        if let Some(children) = parent.borrow_mut().children_mut() {
            let index = children
                .iter()
                .position(|child| Rc::ptr_eq(child, sibling))
                .unwrap_or(children.len());
            children.insert(index, node);
        };
    }

    /// Adds attributes to the target node if they are missing.
    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let Node::Element(ref mut elem) = *target.borrow_mut() {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if !elem.attributes.iter().any(|(k, _)| k == &key) {
                    elem.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        let Some(parent) = parent_of(target) else {
            return;
        };
        if let Some(children) = parent.borrow_mut().children_mut() {
            children.retain(|child| !Rc::ptr_eq(child, target));
        }
        if let Node::Element(ref mut elem) = *target.borrow_mut() {
            elem.parent = None;
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let moved = match node.borrow_mut().children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        };
        for child in &moved {
            set_parent(child, new_parent);
        }
        if let Some(children) = new_parent.borrow_mut().children_mut() {
            children.extend(moved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect_structure(node: &Handle, depth: usize, output: &mut String) {
        match &*node.borrow() {
            Node::DocumentRoot(root) => {
                for child in &root.children {
                    collect_structure(child, depth, output);
                }
            }
            Node::Element(elem) => {
                *output += &format!("{}<{}>\n", "  ".repeat(depth), elem.tag);
                for child in &elem.children {
                    collect_structure(child, depth + 1, output);
                }
            }
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    *output += &format!("{}{}\n", "  ".repeat(depth), trimmed);
                }
            }
            Node::Comment(_) => {}
        }
    }

    fn structure(html: &str) -> String {
        let document = create_dom_tree(html);
        let mut output = String::new();
        collect_structure(&document.root, 0, &mut output);
        output
    }

    #[test]
    fn test_basic_structure() {
        let html = r#"
            <!DOCTYPE html>
            <html>
                <head><title>Test</title></head>
                <body><h1>Hello</h1><p>World</p></body>
            </html>
        "#;
        let expected = "<html>\n  <head>\n    <title>\n      Test\n  <body>\n    <h1>\n      Hello\n    <p>\n      World\n";
        assert_eq!(structure(html), expected);
        assert_eq!(
            create_dom_tree(html).doctype.borrow().clone(),
            Some("html".to_string())
        );
    }

    #[test]
    fn test_table_foster_parenting() {
        // The stray text is foster-parented in front of the table.
        let expected = "<html>\n  <head>\n  <body>\n    oops\n    <table>\n      <tbody>\n        <tr>\n          <td>\n            Cell\n";
        assert_eq!(
            structure("<table>oops<tr><td>Cell</td></tr></table>"),
            expected
        );
    }

    #[test]
    fn test_misnested_formatting_elements() {
        // Adoption agency: <b> is closed and re-opened around the paragraph text.
        let out = structure("<b>1<p>2</b>3</p>");
        assert_eq!(
            out,
            "<html>\n  <head>\n  <body>\n    <b>\n      1\n    <p>\n      <b>\n        2\n      3\n"
        );
    }

    #[test]
    fn test_attributes_kept_in_order() {
        let document = create_dom_tree(r#"<a href="https://example.com" class="x  y" data-test="123">Link</a>"#);
        let mut found = Vec::new();
        fn walk(node: &Handle, found: &mut Vec<(String, String)>) {
            if let Some(children) = node.borrow().children() {
                for child in children {
                    if let Node::Element(elem) = &*child.borrow() {
                        if elem.tag == "a" {
                            found.extend(elem.attributes.iter().cloned());
                            assert_eq!(elem.classes().collect::<Vec<_>>(), vec!["x", "y"]);
                        }
                    }
                    walk(child, found);
                }
            }
        }
        walk(&document.root, &mut found);
        assert_eq!(
            found,
            vec![
                ("href".to_string(), "https://example.com".to_string()),
                ("class".to_string(), "x  y".to_string()),
                ("data-test".to_string(), "123".to_string()),
            ]
        );
    }
}
