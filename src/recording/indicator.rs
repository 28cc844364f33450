use crate::page::Page;

use super::recorder::IGNORE_ATTRIBUTE;

pub const INDICATOR_ID: &str = "__tasker-recording-indicator";

const INDICATOR_STYLE: &str = "position:fixed;top:12px;right:12px;z-index:2147483647;\
padding:6px 10px;border-radius:6px;background:#dc2626;color:#fff;\
font:600 12px/1 system-ui,sans-serif;pointer-events:none";

/// Told when a recorder enters or leaves the recording state
pub trait RecordingObserver: Send + Sync {
    fn recording_started(&self, page: &mut Page);
    fn recording_stopped(&self, page: &mut Page);
}

/// Fixed-position "Recording" badge shown on the page while recording
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayIndicator;

impl RecordingObserver for OverlayIndicator {
    fn recording_started(&self, page: &mut Page) {
        let doc = page.document_mut();
        if doc.get_element_by_id(INDICATOR_ID).is_some() {
            return;
        }
        let Some(body) = doc.body() else {
            tracing::warn!("Page has no body; recording indicator not shown");
            return;
        };

        let overlay = doc.create_element(
            "div",
            vec![
                ("id".to_string(), INDICATOR_ID.to_string()),
                (IGNORE_ATTRIBUTE.to_string(), String::new()),
                ("style".to_string(), INDICATOR_STYLE.to_string()),
            ],
        );
        let label = doc.create_text("\u{25CF} Recording");
        doc.append_child(overlay, label);
        doc.append_child(body, overlay);
    }

    fn recording_stopped(&self, page: &mut Page) {
        let doc = page.document_mut();
        if let Some(overlay) = doc.get_element_by_id(INDICATOR_ID) {
            doc.detach(overlay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_overlay_inserted_and_removed() {
        let mut page = Page::from_html("https://a.test/", "<body><p>hi</p></body>");
        OverlayIndicator.recording_started(&mut page);
        OverlayIndicator.recording_started(&mut page);

        let doc = page.document();
        let overlays = doc.query_selector_all(&format!("#{INDICATOR_ID}")).unwrap();
        assert_eq!(overlays.len(), 1);
        assert!(doc.has_attr(overlays[0], IGNORE_ATTRIBUTE));

        OverlayIndicator.recording_stopped(&mut page);
        assert!(page.document().get_element_by_id(INDICATOR_ID).is_none());
    }

    #[test]
    fn test_missing_body_is_tolerated() {
        let mut page = Page::new("https://a.test/", crate::dom::Document::new());
        OverlayIndicator.recording_started(&mut page);
        OverlayIndicator.recording_stopped(&mut page);
    }
}
