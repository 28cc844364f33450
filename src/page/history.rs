use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    Push,
    Replace,
    Pop,
    Route,
}

/// Notified after the page URL changes without a document load
pub trait NavigationObserver: Send + Sync {
    fn on_navigate(&self, url: &str, kind: NavigationKind);
}

/// Session history of one page, with optional wrappers around
/// `pushState`/`replaceState` that run after the original mutation.
#[derive(Default)]
pub struct History {
    entries: Vec<String>,
    index: usize,
    wrappers: Vec<(String, Arc<dyn NavigationObserver>)>,
}

impl History {
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![initial_url.to_string()],
            index: 0,
            wrappers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.index).map(String::as_str)
    }

    pub fn push_state(&mut self, url: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url.to_string());
        self.index = self.entries.len() - 1;
        self.notify_wrappers(url, NavigationKind::Push);
    }

    pub fn replace_state(&mut self, url: &str) {
        match self.entries.get_mut(self.index) {
            Some(entry) => *entry = url.to_string(),
            None => self.entries.push(url.to_string()),
        }
        self.notify_wrappers(url, NavigationKind::Replace);
    }

    /// Move through history; returns the new current URL when the move is possible
    pub fn go(&mut self, delta: i64) -> Option<String> {
        if delta == 0 {
            return None;
        }
        let target = i64::try_from(self.index).ok()?.checked_add(delta)?;
        let target = usize::try_from(target).ok()?;
        if target >= self.entries.len() {
            return None;
        }
        self.index = target;
        self.current().map(str::to_string)
    }

    /// Wrap the state-mutation entry points. Wrappers are keyed so the same
    /// owner never wraps twice; they are never removed.
    pub fn install_wrapper(&mut self, key: &str, observer: Arc<dyn NavigationObserver>) -> bool {
        if self.is_wrapped_by(key) {
            return false;
        }
        self.wrappers.push((key.to_string(), observer));
        true
    }

    pub fn is_wrapped_by(&self, key: &str) -> bool {
        self.wrappers.iter().any(|(owner, _)| owner == key)
    }

    pub fn is_wrapped(&self) -> bool {
        !self.wrappers.is_empty()
    }

    fn notify_wrappers(&self, url: &str, kind: NavigationKind) {
        for (_, observer) in &self.wrappers {
            observer.on_navigate(url, kind);
        }
    }
}
