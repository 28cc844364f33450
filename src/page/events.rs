use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::Arc;

use crate::dom::NodeId;

use super::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Input,
    Change,
    Focus,
    Blur,
    Submit,
    PopState,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Input => "input",
            EventType::Change => "change",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::Submit => "submit",
            EventType::PopState => "popstate",
        }
    }
}

/// An event travelling through the page. Element events carry a target;
/// window events (popstate) do not.
#[derive(Debug)]
pub struct DomEvent {
    event_type: EventType,
    target: Option<NodeId>,
    bubbles: bool,
    cancelable: bool,
    trusted: bool,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(event_type: EventType, target: Option<NodeId>) -> Self {
        Self {
            event_type,
            target,
            bubbles: false,
            cancelable: false,
            trusted: false,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn bubbling(mut self) -> Self {
        self.bubbles = true;
        self
    }

    pub fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    /// Mark as originating from the user rather than from script
    pub fn trusted(mut self) -> Self {
        self.trusted = true;
        self
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Window,
    Document,
    Element(NodeId),
}

/// Page-level event handler. Listeners see the page read-only.
pub trait EventListener: Send + Sync {
    fn handle_event(&self, page: &Page, event: &DomEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    target: ListenerTarget,
    event_type: EventType,
    capture: bool,
    listener: Arc<dyn EventListener>,
}

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    entries: Vec<Registration>,
}

impl ListenerRegistry {
    pub fn add(
        &mut self,
        target: ListenerTarget,
        event_type: EventType,
        capture: bool,
        listener: Arc<dyn EventListener>,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(Registration {
            id,
            target,
            event_type,
            capture,
            listener,
        });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Listeners for one stop of the propagation path, in registration order.
    /// `capture: None` selects both phases (the at-target stop).
    pub(crate) fn matching(
        &self,
        target: ListenerTarget,
        event_type: EventType,
        capture: Option<bool>,
    ) -> Vec<Arc<dyn EventListener>> {
        self.entries
            .iter()
            .filter(|entry| entry.target == target && entry.event_type == event_type)
            .filter(|entry| capture.map_or(true, |phase| entry.capture == phase))
            .map(|entry| Arc::clone(&entry.listener))
            .collect()
    }
}
