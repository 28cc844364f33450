//! End-to-end recording tests against the signup fixture: record a session
//! through relayed user events, then replay it on a fresh copy of the page.

use tasker_content::dom::NodeId;
use tasker_content::models::{ReplayStatus, StepAction, WorkflowStep};
use tasker_content::recording::{Recorder, INDICATOR_ID};
use tasker_content::replay::replay_steps;
use tasker_content::Page;

const SIGNUP_URL: &str = "https://app.tasker.test/signup";

fn signup_page() -> Page {
    Page::from_html(SIGNUP_URL, include_str!("fixtures/signup.html"))
}

fn node(page: &Page, selector: &str) -> NodeId {
    page.document()
        .query_selector(selector)
        .unwrap()
        .unwrap_or_else(|| panic!("{selector} not in fixture"))
}

fn summary(steps: &[WorkflowStep]) -> Vec<(StepAction, String, String)> {
    steps
        .iter()
        .map(|s| {
            (
                s.action,
                s.selector.clone().or_else(|| s.url.clone()).unwrap_or_default(),
                s.value.clone().unwrap_or_default(),
            )
        })
        .collect()
}

/// Records a signup: typing, a checkbox, a select, an ignored click and submit
fn record_signup(page: &mut Page, recorder: &Recorder) -> Vec<WorkflowStep> {
    assert!(recorder.start(page));
    assert!(page.document().get_element_by_id(INDICATOR_ID).is_some());

    let email = node(page, "#email");
    for value in ["a", "ad", "ada@x.io"] {
        page.type_into(email, value).unwrap();
    }
    let name = node(page, "[name=display_name]");
    page.type_into(name, "Ada").unwrap();

    let terms = node(page, "#terms");
    page.click(terms, true);

    let plan = node(page, "select");
    page.type_into(plan, "team").unwrap();

    let logo = node(page, "a.logo");
    page.click(logo, true);

    let submit = node(page, "button.btn");
    page.click(submit, true);

    let steps = recorder.stop(page);
    assert!(page.document().get_element_by_id(INDICATOR_ID).is_none());
    steps
}

#[test]
fn test_records_signup_session() {
    let mut page = signup_page();
    let recorder = Recorder::new();
    let steps = record_signup(&mut page, &recorder);

    assert_eq!(
        summary(&steps),
        vec![
            (StepAction::Navigate, SIGNUP_URL.to_string(), String::new()),
            (StepAction::Fill, "#email".into(), "ada@x.io".into()),
            (StepAction::Fill, r#"[name="display_name"]"#.into(), "Ada".into()),
            (StepAction::Click, "#terms".into(), String::new()),
            (StepAction::Fill, "#terms".into(), "true".into()),
            (StepAction::Fill, r#"[data-testid="plan-picker"]"#.into(), "team".into()),
            (
                StepAction::Click,
                "main > form:nth-of-type(1) > button.btn".into(),
                String::new()
            ),
        ]
    );
    assert!(steps.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(page.submissions().len(), 1);
}

#[test]
fn test_replay_reproduces_submission() {
    let mut recorded_page = signup_page();
    let recorder = Recorder::new();
    let steps = record_signup(&mut recorded_page, &recorder);

    let mut fresh = signup_page();
    let report = replay_steps(&mut fresh, &steps);
    assert_eq!(report.status, ReplayStatus::Completed);
    assert_eq!(report.failed_count(), 0, "{:?}", report.results);

    let original = &recorded_page.submissions()[0];
    let replayed = &fresh.submissions()[0];
    assert_eq!(original.entries, replayed.entries);
    assert_eq!(replayed.entry("email"), Some("ada@x.io"));
    assert_eq!(replayed.entry("terms"), Some("accepted"));
    assert_eq!(replayed.entry("billing"), Some("monthly"));
    assert_eq!(replayed.entry("csrf"), Some("a1b2c3"));
    assert_eq!(replayed.action, "https://app.tasker.test/accounts");
    assert_eq!(replayed.method, "post");
}

#[test]
fn test_spa_navigation_between_sessions() {
    let mut page = signup_page();
    let recorder = Recorder::new();

    recorder.start(&mut page);
    page.push_state("/signup/step-2");
    page.replace_state("step-3");
    let steps = recorder.stop(&mut page);
    let urls: Vec<&str> = steps.iter().filter_map(|s| s.url.as_deref()).collect();
    assert_eq!(
        urls,
        vec![
            SIGNUP_URL,
            "https://app.tasker.test/signup/step-2",
            "https://app.tasker.test/signup/step-3",
        ]
    );

    // wrapper stays installed but records nothing once idle
    page.push_state("/elsewhere");
    assert!(page.history().is_wrapped());

    recorder.start(&mut page);
    let steps = recorder.stop(&mut page);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].url.as_deref(), Some("https://app.tasker.test/elsewhere"));
}

#[test]
fn test_routing_hook_replaces_history_wrapping() {
    let mut page = signup_page();
    page.set_routing_hook(true);
    let recorder = Recorder::new();

    recorder.start(&mut page);
    page.notify_route_change("/signup/details");
    page.push_state("/ignored-by-router-path");
    let steps = recorder.stop(&mut page);

    assert_eq!(steps.len(), 2);
    assert_eq!(
        steps[1].url.as_deref(),
        Some("https://app.tasker.test/signup/details")
    );
    assert!(!page.history().is_wrapped());

    page.notify_route_change("/after-stop");
    assert!(recorder.steps().is_empty());
}

#[test]
fn test_replay_pauses_for_document_navigation() {
    let mut page = signup_page();
    let steps = vec![
        WorkflowStep::navigate(SIGNUP_URL, 1),
        WorkflowStep::fill("#email", "b@x.io", 2),
        WorkflowStep::navigate("https://app.tasker.test/welcome", 3),
        WorkflowStep::click("#continue", 4),
    ];

    let report = replay_steps(&mut page, &steps);
    assert_eq!(report.status, ReplayStatus::PendingNavigation);
    assert_eq!(report.next_step, 3);
    assert_eq!(
        report.pending_url.as_deref(),
        Some("https://app.tasker.test/welcome")
    );

    let mut next = Page::from_html(
        "https://app.tasker.test/welcome",
        r#"<body><button id="continue">Continue</button></body>"#,
    );
    let report = replay_steps(&mut next, &steps[report.next_step - 1..]);
    assert_eq!(report.status, ReplayStatus::Completed);
    assert_eq!(report.failed_count(), 0);
}

#[test]
fn test_replay_reproduces_unchecking() {
    let mut page = signup_page();
    let recorder = Recorder::new();
    recorder.start(&mut page);
    let terms = node(&page, "#terms");
    page.click(terms, true);
    page.click(terms, true);
    let steps = recorder.stop(&mut page);
    assert!(!page.document().checked(terms));

    let values: Vec<Option<&str>> = steps.iter().map(|s| s.value.as_deref()).collect();
    assert_eq!(values, vec![None, None, Some("true"), None, Some("false")]);

    let mut fresh = signup_page();
    let report = replay_steps(&mut fresh, &steps);
    assert_eq!(report.failed_count(), 0);
    let terms = node(&fresh, "#terms");
    assert!(!fresh.document().checked(terms));
}
