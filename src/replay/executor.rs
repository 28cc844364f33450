use reqwest::Url;

use crate::error::ActuationError;
use crate::forms::fill_field;
use crate::models::{ReplayReport, ReplayStatus, StepAction, StepResult, WorkflowStep};
use crate::page::Page;

/// Replay recorded steps against the live page, in order.
///
/// Failed steps are reported and replay moves on. A `navigate` step to a
/// different document stops the run with [`ReplayStatus::PendingNavigation`];
/// the host loads `pending_url` and resumes from `next_step`.
pub fn replay_steps(page: &mut Page, steps: &[WorkflowStep]) -> ReplayReport {
    tracing::info!("Starting replay with {} steps on {}", steps.len(), page.url());
    let mut results = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        if step.action == StepAction::Navigate {
            let url = step.url.as_deref().unwrap_or_default();
            if !same_document(page.url(), url) {
                tracing::info!("Replay paused at step {} for navigation to {}", index + 1, url);
                return ReplayReport {
                    status: ReplayStatus::PendingNavigation,
                    total_steps: steps.len(),
                    next_step: index + 1,
                    pending_url: Some(url.to_string()),
                    results,
                };
            }
            results.push(StepResult::success(index, step.action));
            continue;
        }

        let result = match execute_step(page, step) {
            Ok(()) => StepResult::success(index, step.action),
            Err(e) => {
                tracing::warn!("Step {} ({}) failed: {}", index + 1, step.action.as_str(), e);
                StepResult::failure(index, step.action, e.to_string())
            }
        };
        results.push(result);
    }

    let report = ReplayReport {
        status: ReplayStatus::Completed,
        total_steps: steps.len(),
        next_step: steps.len(),
        pending_url: None,
        results,
    };
    tracing::info!(
        "Replay completed: {} steps, {} failed",
        report.total_steps,
        report.failed_count()
    );
    report
}

fn execute_step(page: &mut Page, step: &WorkflowStep) -> Result<(), ActuationError> {
    let selector = step.selector.as_deref().unwrap_or_default();
    match step.action {
        StepAction::Click => {
            let node = page
                .document()
                .query_selector(selector)?
                .ok_or_else(|| ActuationError::ElementNotFound(selector.to_string()))?;
            page.click(node, false);
            Ok(())
        }
        StepAction::Fill => {
            fill_field(page, selector, step.value.as_deref().unwrap_or_default())?;
            Ok(())
        }
        StepAction::Navigate => Ok(()),
    }
}

/// Same URL ignoring the fragment
fn same_document(current: &str, target: &str) -> bool {
    match (Url::parse(current), Url::parse(target)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        }
        _ => current == target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"<body><form id="f" action="/done">
        <input id="email"><input type="checkbox" id="agree">
        <button type="submit" id="go">Go</button></form></body>"#;

    #[test]
    fn test_replays_fill_and_click() {
        let mut page = Page::from_html("https://a.test/signup", FORM);
        let steps = vec![
            WorkflowStep::navigate("https://a.test/signup#top", 1),
            WorkflowStep::fill("#email", "ada@a.test", 2),
            WorkflowStep::click("#agree", 3),
            WorkflowStep::click("#go", 4),
        ];

        let report = replay_steps(&mut page, &steps);
        assert_eq!(report.status, ReplayStatus::Completed);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(report.results.len(), 4);

        let submission = &page.submissions()[0];
        assert_eq!(submission.action, "https://a.test/done");
        let agree = page.document().get_element_by_id("agree").unwrap();
        assert!(page.document().checked(agree));
    }

    #[test]
    fn test_failed_step_does_not_stop_replay() {
        let mut page = Page::from_html("https://a.test/signup", FORM);
        let steps = vec![
            WorkflowStep::click("#missing", 1),
            WorkflowStep::fill("#email", "x", 2),
        ];
        let report = replay_steps(&mut page, &steps);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.results[0].error.as_deref(), Some("Element not found: #missing"));
        assert!(report.results[1].success);
    }

    #[test]
    fn test_stops_at_cross_document_navigation() {
        let mut page = Page::from_html("https://a.test/signup", FORM);
        let steps = vec![
            WorkflowStep::fill("#email", "x", 1),
            WorkflowStep::navigate("https://a.test/welcome", 2),
            WorkflowStep::click("#next", 3),
        ];
        let report = replay_steps(&mut page, &steps);
        assert_eq!(report.status, ReplayStatus::PendingNavigation);
        assert_eq!(report.pending_url.as_deref(), Some("https://a.test/welcome"));
        assert_eq!(report.next_step, 2);
        assert_eq!(report.results.len(), 1);
    }
}
