//! Form introspection, actuation and content extraction on the signup fixture.

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use tasker_content::content::{extract_page_content, DEFAULT_MAX_TEXT_CHARS};
use tasker_content::forms::{fill_field, introspect_forms, submit_form};
use tasker_content::{ActuationError, MessageDispatcher, Page, Recorder};

fn signup_page() -> Page {
    Page::from_html(
        "https://app.tasker.test/signup",
        include_str!("fixtures/signup.html"),
    )
}

#[test]
fn test_introspects_signup_form() {
    let page = signup_page();
    let forms = introspect_forms(&page);

    // the newsletter form has nothing fillable
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form.id, "signup");
    assert_eq!(form.selector, "#signup");
    assert_eq!(form.action, "https://app.tasker.test/accounts");
    assert_eq!(form.method, "post");

    let summary: Vec<(&str, &str, &str)> = form
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.field_type.as_str(), f.label.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("email", "email", "Email address"),
            ("display_name", "text", "Display name"),
            ("company", "text", "Company (optional)"),
            ("phone", "tel", "Phone number"),
            ("plan", "select-one", ""),
            ("billing", "radio", "Monthly"),
            ("billing", "radio", "Yearly"),
            ("terms", "checkbox", "I accept the terms"),
            ("notes", "textarea", "Anything else?"),
        ]
    );

    let email = &form.fields[0];
    assert!(email.required);
    assert_eq!(email.placeholder, "you@example.com");
    assert_eq!(email.selector, "#email");
    assert_eq!(form.fields[4].selector, r#"[data-testid="plan-picker"]"#);
    assert_eq!(form.fields[4].options.len(), 4);
    assert_eq!(form.fields[5].checked, Some(true));
    assert_eq!(form.fields[6].checked, Some(false));
}

#[test]
fn test_fill_and_submit_signup() {
    let mut page = signup_page();
    assert_ok!(fill_field(&mut page, "#email", "grace@x.io"));
    assert_ok!(fill_field(&mut page, "[data-testid=plan-picker]", "enterprise"));
    assert_ok!(fill_field(&mut page, "#yearly", "yearly"));
    assert_ok!(fill_field(&mut page, "#terms", "true"));
    assert_ok!(fill_field(&mut page, "[name=notes]", "Call me"));

    let action = submit_form(&mut page, "#signup").unwrap();
    assert_eq!(action, "https://app.tasker.test/accounts");

    let submission = &page.submissions()[0];
    assert_eq!(submission.entry("email"), Some("grace@x.io"));
    assert_eq!(submission.entry("plan"), Some("enterprise"));
    assert_eq!(submission.entry("billing"), Some("yearly"));
    assert_eq!(submission.entry("terms"), Some("accepted"));
    assert_eq!(submission.entry("notes"), Some("Call me"));
}

#[test]
fn test_select_text_match_and_failures() {
    let mut page = signup_page();
    assert_ok!(fill_field(&mut page, "select", "  ENTERPRISE "));
    let forms = introspect_forms(&page);
    assert_eq!(forms[0].fields[4].value, "enterprise");

    let err = assert_err!(fill_field(&mut page, "select", "gold"));
    assert_eq!(err, ActuationError::OptionNotFound("gold".to_string()));

    let err = assert_err!(fill_field(&mut page, "#missing", "x"));
    assert_eq!(err.to_string(), "Element not found: #missing");

    let err = assert_err!(submit_form(&mut page, "#nope"));
    assert_eq!(err.to_string(), "Form not found: #nope");
}

#[test]
fn test_newsletter_submit_uses_submit_input() {
    let mut page = signup_page();
    let action = submit_form(&mut page, "#newsletter").unwrap();
    assert_eq!(action, "https://news.example.com/subscribe");
    assert_eq!(page.submissions()[0].method, "get");
    assert!(page.submissions()[0].submitter.is_some());
}

#[test]
fn test_page_content_of_fixture() {
    let page = signup_page();
    let content = extract_page_content(&page, DEFAULT_MAX_TEXT_CHARS);
    assert_eq!(content.title, "Create account");
    assert_eq!(content.description, "Create an account to start automating.");
    assert!(content.text.starts_with("Create account It takes less than a minute."));
    assert!(!content.text.contains("Please enable JavaScript"));
    assert!(!content.text.contains("window.analytics"));
    assert!(page.document().query_selector("noscript").unwrap().is_some());
}

#[test]
fn test_dispatcher_messages_on_fixture() {
    let mut page = signup_page();
    let dispatcher = MessageDispatcher::new(Recorder::new()).with_max_text_chars(14);

    let reply = dispatcher.dispatch_json(&mut page, json!({ "action": "getPageContent" }));
    let reply = serde_json::to_value(reply).unwrap();
    assert_eq!(reply["text"], "Create account");

    let reply = dispatcher.dispatch_json(
        &mut page,
        json!({ "action": "fillFormField", "selector": "#nowhere", "value": "x" }),
    );
    assert_eq!(
        serde_json::to_value(reply).unwrap(),
        json!({ "ok": false, "error": "Element not found: #nowhere" })
    );
}

#[test]
fn test_deeply_nested_page() {
    let depth = 20_000;
    let html = format!(
        "<body><form id=deep>{}<label>Query <input name=q></label>{}</form></body>",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    );
    let mut page = Page::from_html("https://deep.test/", &html);

    let forms = introspect_forms(&page);
    assert_eq!(forms[0].fields[0].label, "Query");
    assert_ok!(fill_field(&mut page, "[name=q]", "rust"));

    let content = extract_page_content(&page, DEFAULT_MAX_TEXT_CHARS);
    assert_eq!(content.text, "Query");
}
