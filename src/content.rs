use crate::dom::{collapse_whitespace, Document};
use crate::models::PageContent;
use crate::page::Page;

pub const DEFAULT_MAX_TEXT_CHARS: usize = 15_000;

const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=main]"];
const STRIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// Readable text of the page's main content. Works on a copy of the
/// content root so the live document is left as it was.
pub fn extract_page_content(page: &Page, max_chars: usize) -> PageContent {
    let doc = page.document();

    let root = CONTENT_ROOTS
        .iter()
        .find_map(|selector| doc.query_selector(selector).ok().flatten())
        .or_else(|| doc.body())
        .or_else(|| doc.document_element());

    let text = match root {
        Some(root) => {
            let (mut copy, root) = doc.clone_subtree(root);
            strip_non_content(&mut copy);
            truncate_chars(&collapse_whitespace(&copy.text_content(root)), max_chars)
        }
        None => String::new(),
    };

    let description = doc
        .query_selector("meta[name=description]")
        .ok()
        .flatten()
        .and_then(|meta| doc.attr(meta, "content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    PageContent {
        title: page.title(),
        url: page.url().to_string(),
        text,
        description,
    }
}

fn strip_non_content(doc: &mut Document) {
    for tag in STRIPPED_TAGS {
        for node in doc.elements_by_tag_name(doc.root(), tag) {
            doc.detach(node);
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<html><head><title> Release  notes </title>
        <meta name="description" content=" What changed "></head>
        <body><nav>Home</nav>
        <article><h1>v2</h1><script>track()</script><style>p{}</style>
        <p>Faster   parsing.</p><noscript>enable js</noscript></article>
        </body></html>"#;

    #[test]
    fn test_prefers_article_and_strips_scripts() {
        let page = Page::from_html("https://blog.test/v2", ARTICLE);
        let content = extract_page_content(&page, DEFAULT_MAX_TEXT_CHARS);
        assert_eq!(content.title, "Release notes");
        assert_eq!(content.text, "v2 Faster parsing.");
        assert_eq!(content.description, "What changed");
        assert_eq!(content.url, "https://blog.test/v2");
    }

    #[test]
    fn test_live_document_is_untouched() {
        let page = Page::from_html("https://blog.test/v2", ARTICLE);
        let before = page.document().query_selector_all("script, style, noscript").unwrap();
        extract_page_content(&page, DEFAULT_MAX_TEXT_CHARS);
        let after = page.document().query_selector_all("script, style, noscript").unwrap();
        assert_eq!(before.len(), 3);
        assert_eq!(before, after);
    }

    #[test]
    fn test_role_main_then_body_fallback() {
        let page = Page::from_html(
            "https://a.test/",
            r#"<body><div>chrome</div><div role="main">core</div></body>"#,
        );
        assert_eq!(extract_page_content(&page, 100).text, "core");

        let page = Page::from_html("https://a.test/", "<body><p>only body</p></body>");
        let content = extract_page_content(&page, 100);
        assert_eq!(content.text, "only body");
        assert_eq!(content.description, "");
    }

    #[test]
    fn test_truncates_by_characters() {
        let body = format!("<body><p>{}</p></body>", "é".repeat(20));
        let page = Page::from_html("https://a.test/", &body);
        assert_eq!(extract_page_content(&page, 5).text, "ééééé");
    }
}
