use regex::Regex;
use std::sync::LazyLock;

use crate::dom::{css_escape, Document, NodeId};

/// Structural fallback stops after this many segments, unique or not
const MAX_SEGMENTS: usize = 3;
const MAX_CLASSES: usize = 2;

/// Generated class names (CSS modules, styled-components) that change per build
static HASHED_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9]*_[A-Za-z][A-Za-z0-9]*_{1,2}[A-Za-z0-9]{3,8}$")
        .expect("hashed class pattern is valid")
});

/// Build a CSS selector for `node` without consulting the rest of the page.
///
/// Stable attributes win in order: `id`, `data-testid`, `name`, `aria-label`.
/// Otherwise the selector is a short `tag.class:nth-of-type(k)` path ending
/// at the element.
pub fn synthesize_selector(doc: &Document, node: NodeId) -> String {
    let node = if doc.is_element(node) {
        node
    } else {
        match doc.parent_element(node) {
            Some(parent) => parent,
            None => return "html".to_string(),
        }
    };
    let Some(element) = doc.element(node) else {
        return "html".to_string();
    };

    if let Some(id) = element.non_empty_attr("id") {
        return format!("#{}", css_escape(id));
    }
    for attr in ["data-testid", "name", "aria-label"] {
        if let Some(value) = element.non_empty_attr(attr) {
            return format!("[{}=\"{}\"]", attr, css_escape(value));
        }
    }

    structural_selector(doc, node)
}

fn structural_selector(doc: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node);

    while let Some(n) = current {
        if segments.len() == MAX_SEGMENTS {
            break;
        }
        let Some(tag) = doc.tag_name(n) else {
            break;
        };
        if tag == "body" || tag == "html" {
            break;
        }
        segments.push(segment(doc, n, tag));
        current = doc.parent_element(n);
    }

    if segments.is_empty() {
        return doc.tag_name(node).unwrap_or("html").to_string();
    }
    segments.reverse();
    segments.join(" > ")
}

fn segment(doc: &Document, node: NodeId, tag: &str) -> String {
    let mut out = css_escape(tag);

    if let Some(element) = doc.element(node) {
        for class in element.classes().filter(|c| is_stable_class(c)).take(MAX_CLASSES) {
            out.push('.');
            out.push_str(&css_escape(class));
        }
    }

    if let Some(parent) = doc.parent(node) {
        let same_tag: Vec<NodeId> = doc
            .element_children(parent)
            .filter(|c| doc.tag_name(*c) == Some(tag))
            .collect();
        if same_tag.len() > 1 {
            if let Some(position) = same_tag.iter().position(|c| *c == node) {
                out.push_str(&format!(":nth-of-type({})", position + 1));
            }
        }
    }

    out
}

fn is_stable_class(class: &str) -> bool {
    !class.contains("--") && !HASHED_CLASS.is_match(class)
}
