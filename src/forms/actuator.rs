use crate::dom::NodeId;
use crate::error::{ActuationError, DomError};
use crate::models::FilledField;
use crate::page::{DomEvent, EventType, Page};

/// Set a form control to `value` the way a user would, then fire
/// `input`, `change` and `blur` so page listeners see the edit.
///
/// Nothing on the page changes when this returns an error.
pub fn fill_field(page: &mut Page, selector: &str, value: &str) -> Result<FilledField, ActuationError> {
    let node = page
        .document()
        .query_selector(selector)?
        .ok_or_else(|| ActuationError::ElementNotFound(selector.to_string()))?;

    let element = page.document().element(node).ok_or(DomError::NotAnElement)?;
    let tag = element.tag().to_string();
    let is_toggle = element.is_toggle();
    match tag.as_str() {
        "select" => {
            let option = find_option(page, node, value)
                .ok_or_else(|| ActuationError::OptionNotFound(value.to_string()))?;
            page.document_mut().select_option(node, option);
        }
        "input" if is_toggle => {
            let checked = value == "true" || value == "1" || value == page.document().value(node);
            page.document_mut().set_checked(node, checked);
        }
        "input" | "textarea" => page.document_mut().set_value(node, value)?,
        _ => return Err(DomError::NotAFormField(tag).into()),
    }

    for event_type in [EventType::Input, EventType::Change, EventType::Blur] {
        page.dispatch_event(&DomEvent::new(event_type, Some(node)).bubbling());
    }

    tracing::debug!("Filled {} with {:?}", selector, value);
    Ok(FilledField {
        selector: selector.to_string(),
        value: value.to_string(),
    })
}

/// Exact value match first, then case-insensitive label text
fn find_option(page: &Page, select: NodeId, value: &str) -> Option<NodeId> {
    let doc = page.document();
    let options = doc.options(select);
    if let Some(option) = options.iter().find(|o| doc.option_value(**o) == value) {
        return Some(*option);
    }
    let wanted = value.trim().to_lowercase();
    options
        .into_iter()
        .find(|o| doc.option_text(*o).to_lowercase() == wanted)
}

/// Submit the `<form>` matched by `selector`.
///
/// Clicks the form's submit control when it has one so submit listeners run;
/// otherwise submits natively. Returns the form's absolute action URL.
pub fn submit_form(page: &mut Page, selector: &str) -> Result<String, ActuationError> {
    let not_found = || ActuationError::FormNotFound(selector.to_string());
    let doc = page.document();
    let form = doc
        .query_selector(selector)?
        .filter(|matched| doc.tag_name(*matched) == Some("form"))
        .ok_or_else(not_found)?;
    let submitter = doc.query_selector_in(form, "button[type=submit], input[type=submit]")?;
    let action = page.form_action(form);

    match submitter {
        Some(button) => {
            if !page.click(button, false) {
                tracing::debug!("Click on submit control of {} was cancelled", selector);
            }
        }
        None => page.submit(form, None),
    }

    tracing::info!("Submitted form {} to {}", selector, action);
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{EventListener, ListenerTarget};
    use std::sync::{Arc, Mutex};

    const FORM: &str = r#"<html><body>
        <form id="signup" action="/join" method="post">
          <input id="name" name="name">
          <textarea name="bio"></textarea>
          <input type="checkbox" id="news" name="news" value="yes">
          <input type="radio" name="plan" id="free" value="free" checked>
          <input type="radio" name="plan" id="pro" value="pro">
          <select id="count"><option value="1">One</option><option value=" x"> 2 </option></select>
          <button type="submit" id="send">Send</button>
        </form>
        <form id="plain" action="/plain"><input name="q"></form>
        <div id="box">not a field</div>
        </body></html>"#;

    fn page() -> Page {
        Page::from_html("https://site.test/", FORM)
    }

    fn node(page: &Page, selector: &str) -> NodeId {
        page.document().query_selector(selector).unwrap().unwrap()
    }

    #[derive(Default)]
    struct Recorded(Mutex<Vec<&'static str>>);

    impl EventListener for Recorded {
        fn handle_event(&self, _page: &Page, event: &DomEvent) {
            self.0.lock().unwrap().push(event.event_type().as_str());
        }
    }

    #[test]
    fn test_text_fill_fires_input_change_blur() {
        let mut page = page();
        let seen = Arc::new(Recorded::default());
        for event_type in [EventType::Input, EventType::Change, EventType::Blur] {
            page.add_event_listener(ListenerTarget::Document, event_type, false, seen.clone());
        }

        let filled = fill_field(&mut page, "#name", "Grace").unwrap();
        assert_eq!(filled.value, "Grace");
        assert_eq!(page.document().value(node(&page, "#name")), "Grace");
        assert_eq!(*seen.0.lock().unwrap(), vec!["input", "change", "blur"]);

        fill_field(&mut page, "[name=bio]", "Hello").unwrap();
        assert_eq!(page.document().value(node(&page, "textarea")), "Hello");
    }

    #[test]
    fn test_checkbox_and_radio() {
        let mut page = page();
        fill_field(&mut page, "#news", "yes").unwrap();
        assert!(page.document().checked(node(&page, "#news")));
        fill_field(&mut page, "#news", "no").unwrap();
        assert!(!page.document().checked(node(&page, "#news")));
        fill_field(&mut page, "#news", "1").unwrap();
        assert!(page.document().checked(node(&page, "#news")));

        fill_field(&mut page, "#pro", "true").unwrap();
        assert!(page.document().checked(node(&page, "#pro")));
        assert!(!page.document().checked(node(&page, "#free")));
    }

    #[test]
    fn test_select_matches_value_then_text() {
        let mut page = page();
        let select = node(&page, "#count");
        fill_field(&mut page, "#count", "2").unwrap();
        assert_eq!(page.document().value(select), " x");
        fill_field(&mut page, "#count", "1").unwrap();
        assert_eq!(page.document().value(select), "1");
        fill_field(&mut page, "#count", "ONE").unwrap();

        let err = fill_field(&mut page, "#count", "3").unwrap_err();
        assert_eq!(err.to_string(), "Option not found: 3");
        assert_eq!(page.document().value(select), "1");
    }

    #[test]
    fn test_failures_leave_page_untouched() {
        let mut page = page();
        let err = fill_field(&mut page, "#missing", "x").unwrap_err();
        assert_eq!(err.to_string(), "Element not found: #missing");

        let err = fill_field(&mut page, "#box", "x").unwrap_err();
        assert!(err.to_string().contains("not a form field"));

        assert!(matches!(
            fill_field(&mut page, "input[", "x"),
            Err(ActuationError::Dom(DomError::InvalidSelector(_)))
        ));
        assert_eq!(page.document().value(node(&page, "#name")), "");
    }

    #[test]
    fn test_submit_prefers_submit_button() {
        let mut page = page();
        fill_field(&mut page, "#name", "Grace").unwrap();
        let action = submit_form(&mut page, "#signup").unwrap();
        assert_eq!(action, "https://site.test/join");

        let submission = &page.submissions()[0];
        assert_eq!(submission.submitter.as_deref(), Some("#send"));
        assert_eq!(submission.entry("name"), Some("Grace"));
        assert_eq!(submission.entry("plan"), Some("free"));
    }

    #[test]
    fn test_submit_without_button_is_native() {
        let mut page = page();
        let seen = Arc::new(Recorded::default());
        page.add_event_listener(ListenerTarget::Document, EventType::Submit, false, seen.clone());

        submit_form(&mut page, "#plain").unwrap();
        assert_eq!(page.submissions().len(), 1);
        assert_eq!(page.submissions()[0].submitter, None);
        assert!(seen.0.lock().unwrap().is_empty());

        let err = submit_form(&mut page, "#box").unwrap_err();
        assert_eq!(err.to_string(), "Form not found: #box");
    }

    #[test]
    fn test_submit_requires_a_form_element() {
        let mut page = page();
        let err = submit_form(&mut page, "#plain input").unwrap_err();
        assert_eq!(err, ActuationError::FormNotFound("#plain input".to_string()));
        assert!(page.submissions().is_empty());
    }
}
