use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dom::{Document, NodeId};
use crate::models::{RecordingSession, WorkflowStep};
use crate::page::{
    DomEvent, EventListener, EventType, ListenerId, ListenerTarget, NavigationKind,
    NavigationObserver, Page,
};

use super::indicator::{OverlayIndicator, RecordingObserver};
use super::navigation::{self, NavigationSubscription};
use super::selector::synthesize_selector;

/// Elements carrying this attribute (or inside one) are never recorded
pub const IGNORE_ATTRIBUTE: &str = "data-tasker-ignore";

/// A recorded step as broadcast to live subscribers. Coalesced fills are
/// re-sent with the same `index`.
#[derive(Debug, Clone, Serialize)]
pub struct StepUpdate {
    pub session_id: String,
    pub index: usize,
    pub step: WorkflowStep,
}

#[derive(Default)]
struct RecorderState {
    session: Option<RecordingSession>,
    listeners: Vec<ListenerId>,
    navigation: Option<NavigationSubscription>,
}

struct Inner {
    id: String,
    state: Mutex<RecorderState>,
    observers: Vec<Box<dyn RecordingObserver>>,
    step_sender: broadcast::Sender<StepUpdate>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &RecordingSession, index: usize) {
        if let Some(step) = session.steps.get(index) {
            // No subscribers is fine
            let _ = self.step_sender.send(StepUpdate {
                session_id: session.id.clone(),
                index,
                step: step.clone(),
            });
        }
    }

    fn record_click(&self, selector: String) {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            return;
        };
        let step = WorkflowStep::click(selector, next_timestamp(session));
        tracing::debug!("Recorded click on {:?}", step.selector);
        session.add_step(step);
        self.publish(session, session.steps.len() - 1);
    }

    /// Keystroke bursts on one field collapse into the trailing fill step
    fn record_input(&self, selector: String, value: String) {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            return;
        };
        let timestamp = next_timestamp(session);

        if let Some(last) = session.steps.last_mut() {
            if last.is_fill_for(&selector) {
                tracing::debug!("Coalesced input for selector {}", selector);
                last.value = Some(value);
                last.timestamp = timestamp;
                self.publish(session, session.steps.len() - 1);
                return;
            }
        }

        tracing::debug!("Recorded fill on {}", selector);
        session.add_step(WorkflowStep::fill(selector, value, timestamp));
        self.publish(session, session.steps.len() - 1);
    }

    fn record_navigation(&self, url: &str) {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            return;
        };
        tracing::debug!("Recorded navigation to {}", url);
        let step = WorkflowStep::navigate(url, next_timestamp(session));
        session.add_step(step);
        self.publish(session, session.steps.len() - 1);
    }
}

fn next_timestamp(session: &RecordingSession) -> i64 {
    Utc::now().timestamp_millis().max(session.last_timestamp())
}

fn is_ignored(doc: &Document, node: NodeId) -> bool {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .any(|n| doc.has_attr(n, IGNORE_ATTRIBUTE))
}

struct ClickCapture(Arc<Inner>);

impl EventListener for ClickCapture {
    fn handle_event(&self, page: &Page, event: &DomEvent) {
        let Some(target) = event.target() else {
            return;
        };
        let doc = page.document();
        if is_ignored(doc, target) {
            return;
        }
        self.0.record_click(synthesize_selector(doc, target));
    }
}

struct InputCapture(Arc<Inner>);

impl EventListener for InputCapture {
    fn handle_event(&self, page: &Page, event: &DomEvent) {
        let Some(target) = event.target() else {
            return;
        };
        let doc = page.document();
        // toggles record their state; their value attribute never changes
        let value = match doc.element(target) {
            Some(element) if element.is_toggle() => doc.checked(target).to_string(),
            _ => doc.value(target),
        };
        self.0.record_input(synthesize_selector(doc, target), value);
    }
}

struct PopStateCapture(Arc<Inner>);

impl EventListener for PopStateCapture {
    fn handle_event(&self, page: &Page, _event: &DomEvent) {
        self.0.record_navigation(page.url());
    }
}

struct NavigationCapture(Arc<Inner>);

impl NavigationObserver for NavigationCapture {
    fn on_navigate(&self, url: &str, _kind: NavigationKind) {
        self.0.record_navigation(url);
    }
}

/// Captures user interactions on a page as workflow steps.
///
/// Idle until [`Recorder::start`]; each start begins a fresh session and
/// [`Recorder::stop`] drains it. Clones share the same recorder.
#[derive(Clone)]
pub struct Recorder {
    inner: Arc<Inner>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_observers(vec![Box::new(OverlayIndicator)])
    }

    pub fn with_observers(observers: Vec<Box<dyn RecordingObserver>>) -> Self {
        let (step_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                id: format!("recorder-{}", Uuid::new_v4()),
                state: Mutex::new(RecorderState::default()),
                observers,
                step_sender: step_tx,
            }),
        }
    }

    /// Begin a session on `page`. Returns false if already recording.
    pub fn start(&self, page: &mut Page) -> bool {
        let session_id = {
            let mut state = self.inner.lock();
            if state.session.is_some() {
                return false;
            }

            let mut session = RecordingSession::start(page.url().to_string());
            session.add_step(WorkflowStep::navigate(
                page.url(),
                Utc::now().timestamp_millis(),
            ));
            self.inner.publish(&session, 0);
            let session_id = session.id.clone();
            state.session = Some(session);

            let inner = &self.inner;
            state.listeners = vec![
                page.add_event_listener(
                    ListenerTarget::Document,
                    EventType::Click,
                    true,
                    Arc::new(ClickCapture(Arc::clone(inner))),
                ),
                page.add_event_listener(
                    ListenerTarget::Document,
                    EventType::Input,
                    true,
                    Arc::new(InputCapture(Arc::clone(inner))),
                ),
                page.add_event_listener(
                    ListenerTarget::Window,
                    EventType::PopState,
                    false,
                    Arc::new(PopStateCapture(Arc::clone(inner))),
                ),
            ];
            state.navigation = Some(navigation::attach(
                page,
                &inner.id,
                Arc::new(NavigationCapture(Arc::clone(inner))),
            ));
            session_id
        };

        for observer in &self.inner.observers {
            observer.recording_started(page);
        }
        tracing::info!("Recording started: {} on {}", session_id, page.url());
        true
    }

    /// End the session and return its steps. Empty when idle.
    pub fn stop(&self, page: &mut Page) -> Vec<WorkflowStep> {
        let (mut session, listeners, subscription) = {
            let mut state = self.inner.lock();
            let Some(session) = state.session.take() else {
                return Vec::new();
            };
            (
                session,
                std::mem::take(&mut state.listeners),
                state.navigation.take(),
            )
        };

        for id in listeners {
            page.remove_event_listener(id);
        }
        if let Some(subscription) = subscription {
            navigation::detach(page, subscription);
        }
        for observer in &self.inner.observers {
            observer.recording_stopped(page);
        }

        session.complete();
        tracing::info!(
            "Recording stopped: {} ({} steps)",
            session.id,
            session.steps.len()
        );
        session.steps
    }

    pub fn is_recording(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner.lock().session.as_ref().map(|s| s.id.clone())
    }

    pub fn step_count(&self) -> usize {
        self.inner
            .lock()
            .session
            .as_ref()
            .map(|s| s.steps.len())
            .unwrap_or(0)
    }

    /// Snapshot of the steps recorded so far
    pub fn steps(&self) -> Vec<WorkflowStep> {
        self.inner
            .lock()
            .session
            .as_ref()
            .map(|s| s.steps.clone())
            .unwrap_or_default()
    }

    pub fn subscribe_steps(&self) -> broadcast::Receiver<StepUpdate> {
        self.inner.step_sender.subscribe()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
