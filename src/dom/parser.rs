use scraper::{Html, Node};

use super::document::{Document, NodeId};

/// Parse an HTML document into a [`Document`].
///
/// html5ever (through scraper) does the tree construction, so missing
/// `<html>`/`<head>`/`<body>` wrappers are synthesized the same way a
/// browser would. Comments, doctypes and processing instructions are dropped.
pub fn parse_html(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut document = Document::new();

    // explicit stack: nesting depth is unbounded in real markup
    let mut pending = vec![(document.root(), *parsed.root_element())];
    while let Some((parent, source)) = pending.pop() {
        match source.value() {
            Node::Element(element) => {
                let attrs = element
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect();
                let node = document.create_element(element.name(), attrs);
                document.append_child(parent, node);
                pending.extend(source.children().rev().map(|child| (node, child)));
            }
            Node::Text(text) => {
                let text_node = document.create_text(text);
                document.append_child(parent, text_node);
            }
            _ => {}
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrappers_are_synthesized() {
        let doc = parse_html("<p>Hello <b>world</b></p>");
        let html = doc.document_element().unwrap();
        assert_eq!(doc.tag_name(html), Some("html"));
        assert!(doc.head().is_some());
        let body = doc.body().unwrap();
        assert_eq!(doc.text_content(body), "Hello world");
    }

    #[test]
    fn test_attributes_preserved() {
        let doc = parse_html(r#"<input ID="Email" data-testid="email-field" Required>"#);
        let input = doc.query_selector("input").unwrap().unwrap();
        assert_eq!(doc.attr(input, "id"), Some("Email"));
        assert_eq!(doc.attr(input, "data-testid"), Some("email-field"));
        assert!(doc.has_attr(input, "required"));
    }

    #[test]
    fn test_deeply_nested_markup() {
        let depth = 20_000;
        let html = format!(
            "<body>{}<input name=q>{}</body>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let doc = parse_html(&html);
        let input = doc.query_selector("input[name=q]").unwrap().unwrap();
        assert_eq!(doc.ancestors(input).count(), depth + 2);
        assert_eq!(doc.descendants(doc.root()).len(), depth + 4);
    }
}
