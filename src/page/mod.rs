pub mod events;
pub mod history;
pub mod loader;

use chrono::Utc;
use reqwest::Url;
use std::sync::Arc;

use crate::dom::{parse_html, Document, NodeId};
use crate::error::DomError;
use crate::models::{FormEntry, FormSubmission};
use crate::recording::synthesize_selector;

pub use events::{DomEvent, EventListener, EventType, ListenerId, ListenerRegistry, ListenerTarget};
pub use history::{History, NavigationKind, NavigationObserver};
pub use loader::{HttpPageLoader, PageLoader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// A live page: document, location, session history, listeners, and the
/// log of form submissions the page has performed.
pub struct Page {
    document: Document,
    url: String,
    history: History,
    listeners: ListenerRegistry,
    routing_hook: bool,
    route_observers: Vec<(ObserverId, Arc<dyn NavigationObserver>)>,
    next_observer_id: u64,
    submissions: Vec<FormSubmission>,
}

impl Page {
    pub fn new(url: &str, document: Document) -> Self {
        let url = normalize_url(url);
        Self {
            document,
            history: History::new(&url),
            url,
            listeners: ListenerRegistry::default(),
            routing_hook: false,
            route_observers: Vec::new(),
            next_observer_id: 0,
            submissions: Vec::new(),
        }
    }

    pub fn from_html(url: &str, html: &str) -> Self {
        Self::new(url, parse_html(html))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> String {
        self.document.title()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Resolve `href` against the page URL; returns it unchanged when that fails
    pub fn resolve_url(&self, href: &str) -> String {
        match Url::parse(&self.url).and_then(|base| base.join(href)) {
            Ok(url) => url.to_string(),
            Err(_) => href.to_string(),
        }
    }

    // Listeners

    pub fn add_event_listener(
        &mut self,
        target: ListenerTarget,
        event_type: EventType,
        capture: bool,
        listener: Arc<dyn EventListener>,
    ) -> ListenerId {
        self.listeners.add(target, event_type, capture, listener)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run an event through capture, target and bubble phases
    pub fn dispatch_event(&self, event: &DomEvent) {
        let event_type = event.event_type();
        let Some(target) = event.target() else {
            self.invoke(ListenerTarget::Window, event, None);
            return;
        };

        let mut path = Vec::new();
        if self.document.is_connected(target) {
            path.push(ListenerTarget::Window);
            path.push(ListenerTarget::Document);
        }
        let mut ancestors: Vec<NodeId> = self.document.ancestors(target).collect();
        ancestors.reverse();
        path.extend(ancestors.into_iter().map(ListenerTarget::Element));

        for stop in &path {
            self.invoke(*stop, event, Some(true));
            if event.propagation_stopped() {
                return;
            }
        }

        self.invoke(ListenerTarget::Element(target), event, None);
        if event.propagation_stopped() || !event.bubbles() {
            return;
        }

        for stop in path.iter().rev() {
            self.invoke(*stop, event, Some(false));
            if event.propagation_stopped() {
                return;
            }
        }
        tracing::trace!("Dispatched {} event", event_type.as_str());
    }

    fn invoke(&self, target: ListenerTarget, event: &DomEvent, capture: Option<bool>) {
        for listener in self.listeners.matching(target, event.event_type(), capture) {
            listener.handle_event(self, event);
        }
    }

    // Interactions

    /// Click an element and run its activation behaviour. Returns false when
    /// a listener cancelled the click.
    pub fn click(&mut self, node: NodeId, trusted: bool) -> bool {
        let toggle_type = self
            .document
            .element(node)
            .filter(|e| e.is_toggle())
            .map(|e| e.input_type());

        // checkbox/radio flip before listeners run and flip back if cancelled
        let mut snapshot = Vec::new();
        if let Some(input_type) = &toggle_type {
            let affected = match self.document.radio_group(node) {
                group if group.is_empty() => vec![node],
                group => group,
            };
            snapshot = affected
                .into_iter()
                .map(|n| (n, self.document.checked(n)))
                .collect();
            let next = input_type == "radio" || !self.document.checked(node);
            self.document.set_checked(node, next);
        }

        let mut event = DomEvent::new(EventType::Click, Some(node))
            .bubbling()
            .cancelable();
        if trusted {
            event = event.trusted();
        }
        self.dispatch_event(&event);

        if event.default_prevented() {
            for (n, _) in &snapshot {
                self.document.set_checked(*n, false);
            }
            for (n, checked) in &snapshot {
                if *checked {
                    self.document.set_checked(*n, true);
                }
            }
            return false;
        }

        if toggle_type.is_some() {
            for event_type in [EventType::Input, EventType::Change] {
                let mut event = DomEvent::new(event_type, Some(node)).bubbling();
                if trusted {
                    event = event.trusted();
                }
                self.dispatch_event(&event);
            }
        } else if self.is_submit_button(node) {
            if let Some(form) = self.document.form_owner(node) {
                self.request_submit(form, Some(node));
            }
        }
        true
    }

    /// User typing relayed by the host: assign the value, then fire `input`
    pub fn type_into(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.document.set_value(node, value)?;
        let event = DomEvent::new(EventType::Input, Some(node))
            .bubbling()
            .trusted();
        self.dispatch_event(&event);
        Ok(())
    }

    fn is_submit_button(&self, node: NodeId) -> bool {
        let Some(element) = self.document.element(node) else {
            return false;
        };
        match element.tag() {
            "button" => element
                .attr("type")
                .map_or(true, |t| t.trim().eq_ignore_ascii_case("submit")),
            "input" => matches!(element.input_type().as_str(), "submit" | "image"),
            _ => false,
        }
    }

    // History

    pub fn push_state(&mut self, href: &str) {
        let url = self.resolve_url(href);
        self.url = url.clone();
        self.history.push_state(&url);
    }

    pub fn replace_state(&mut self, href: &str) {
        let url = self.resolve_url(href);
        self.url = url.clone();
        self.history.replace_state(&url);
    }

    /// Traverse history and fire `popstate` on the window
    pub fn go(&mut self, delta: i64) -> bool {
        let Some(url) = self.history.go(delta) else {
            return false;
        };
        self.url = url;
        self.dispatch_event(&DomEvent::new(EventType::PopState, None).trusted());
        true
    }

    pub fn install_history_wrapper(
        &mut self,
        key: &str,
        observer: Arc<dyn NavigationObserver>,
    ) -> bool {
        self.history.install_wrapper(key, observer)
    }

    // Routing hook

    /// Whether the page's router reports client-side route changes itself
    pub fn has_routing_hook(&self) -> bool {
        self.routing_hook
    }

    pub fn set_routing_hook(&mut self, enabled: bool) {
        self.routing_hook = enabled;
    }

    pub fn add_route_observer(&mut self, observer: Arc<dyn NavigationObserver>) -> ObserverId {
        self.next_observer_id += 1;
        let id = ObserverId(self.next_observer_id);
        self.route_observers.push((id, observer));
        id
    }

    pub fn remove_route_observer(&mut self, id: ObserverId) -> bool {
        let before = self.route_observers.len();
        self.route_observers.retain(|(observer_id, _)| *observer_id != id);
        self.route_observers.len() != before
    }

    /// Called by the page's router after a client-side route change
    pub fn notify_route_change(&mut self, href: &str) {
        self.url = self.resolve_url(href);
        for (_, observer) in &self.route_observers {
            observer.on_navigate(&self.url, NavigationKind::Route);
        }
    }

    // Forms

    /// Absolute submission URL of a form (the page URL when unset)
    pub fn form_action(&self, form: NodeId) -> String {
        match self.document.element(form).and_then(|e| e.non_empty_attr("action")) {
            Some(action) => self.resolve_url(action.trim()),
            None => self.url.clone(),
        }
    }

    pub fn form_method(&self, form: NodeId) -> String {
        self.document
            .element(form)
            .and_then(|e| e.non_empty_attr("method"))
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "get".to_string())
    }

    /// Fire a cancelable `submit` and submit unless a listener prevented it
    pub fn request_submit(&mut self, form: NodeId, submitter: Option<NodeId>) -> bool {
        let event = DomEvent::new(EventType::Submit, Some(form))
            .bubbling()
            .cancelable();
        self.dispatch_event(&event);
        if event.default_prevented() {
            tracing::debug!("Form submission prevented by page listener");
            return false;
        }
        self.submit(form, submitter);
        true
    }

    /// Native `form.submit()`: no submit event, no validation handlers
    pub fn submit(&mut self, form: NodeId, submitter: Option<NodeId>) {
        let submission = FormSubmission {
            form: synthesize_selector(&self.document, form),
            action: self.form_action(form),
            method: self.form_method(form),
            entries: self.form_entries(form, submitter),
            submitter: submitter.map(|s| synthesize_selector(&self.document, s)),
            submitted_at: Utc::now(),
        };
        tracing::info!(
            "Form {} submitted to {} ({} entries)",
            submission.form,
            submission.action,
            submission.entries.len()
        );
        self.submissions.push(submission);
    }

    pub fn submissions(&self) -> &[FormSubmission] {
        &self.submissions
    }

    fn form_entries(&self, form: NodeId, submitter: Option<NodeId>) -> Vec<FormEntry> {
        let doc = &self.document;
        let mut entries = Vec::new();

        for control in doc.descendants(form) {
            let Some(element) = doc.element(control) else {
                continue;
            };
            let Some(name) = element.non_empty_attr("name") else {
                continue;
            };
            if element.has_attr("disabled") {
                continue;
            }
            let mut push = |value: String| {
                entries.push(FormEntry {
                    name: name.to_string(),
                    value,
                })
            };

            match element.tag() {
                "input" => match element.input_type().as_str() {
                    "submit" | "image" | "button" | "reset" => {
                        if submitter == Some(control) {
                            push(doc.value(control));
                        }
                    }
                    "checkbox" | "radio" => {
                        if doc.checked(control) {
                            push(doc.value(control));
                        }
                    }
                    "file" => {}
                    _ => push(doc.value(control)),
                },
                "button" => {
                    if submitter == Some(control) {
                        push(doc.value(control));
                    }
                }
                "textarea" => push(doc.value(control)),
                "select" => {
                    if element.has_attr("multiple") {
                        for option in doc.options(control) {
                            if doc.option_selected(option) {
                                push(doc.option_value(option));
                            }
                        }
                    } else if let Some(option) = doc.selected_option(control) {
                        push(doc.option_value(option));
                    }
                }
                _ => {}
            }
        }

        entries
    }
}

fn normalize_url(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
